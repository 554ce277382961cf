use tokio_util::sync::CancellationToken;

use crate::Id;

/// Per-call request settings shared by every verb.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Identifier appended to the endpoint path.
    pub id: Option<Id>,
    /// Query parameters in insertion order. Values are sent as given.
    pub query: Vec<(String, String)>,
    /// Header overrides. These win over the client's default headers.
    pub headers: Vec<(String, String)>,
    /// Token that aborts the call, including any pending retry wait.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options that only carry an identifier.
    pub fn with_id(id: impl Into<Id>) -> Self {
        Self::new().id(id)
    }

    pub fn id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends one query parameter. Callers must pre-encode reserved characters.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends query parameters from any ordered pair iterator.
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds an `Authorization` override for a per-call token.
    ///
    /// The `Bearer ` scheme is prepended unless the token already carries it.
    pub fn bearer(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", bearer_value(token.as_ref().trim()))
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl From<()> for RequestOptions {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Id> for RequestOptions {
    fn from(id: Id) -> Self {
        Self::with_id(id)
    }
}

impl From<CancellationToken> for RequestOptions {
    fn from(token: CancellationToken) -> Self {
        Self::new().cancel_token(token)
    }
}

fn bearer_value(token: &str) -> String {
    match token.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => token.to_owned(),
        _ => format!("Bearer {token}"),
    }
}
