/// Query-string parameters for [`RequestExecutor::get`](crate::RequestExecutor::get).
///
/// Pairs are sent in insertion order; repeated keys are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Builds parameters from key/value pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Appends one pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Empty parameters become `None` so nothing is appended to the URL.
    pub(crate) fn into_option(self) -> Option<Vec<(String, String)>> {
        (!self.0.is_empty()).then_some(self.0)
    }
}

impl From<()> for QueryParams {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K, V> From<Vec<(K, V)>> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::new(pairs)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::new(pairs)
    }
}

impl<T: Into<QueryParams>> From<Option<T>> for QueryParams {
    fn from(params: Option<T>) -> Self {
        params.map(Into::into).unwrap_or_default()
    }
}
