use reqwest::{header::HeaderMap, Method, StatusCode};

/// Fully assembled outgoing request, as handed to the logging sink.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    /// Default headers merged with per-call overrides.
    pub headers: HeaderMap,
    /// JSON body with lower-cased property names.
    pub body: Option<String>,
}

/// Successful response metadata, as handed to the logging sink.
#[derive(Clone, Debug)]
pub struct ResponseInfo {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Number of retries taken before this response.
    pub retries: usize,
    pub body_len: usize,
}
