use retrying_api_client::RequestExecutor;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API_BASE_URL and API_KEY are required, API_TIMEOUT is optional.
    let api = RequestExecutor::from_env()?;

    let created = api.post("/users", &json!({"name": "Kit"})).await?;
    println!("created: {created:?}");

    match api.get("/users", [("name", "Kit")]).await? {
        Some(users) => println!("{users:#}"),
        None => println!("no content"),
    }

    Ok(())
}
