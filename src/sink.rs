//! Logging hooks invoked around each call.

use reqwest::header::{HeaderMap, AUTHORIZATION};

use crate::{EfetchError, RequestDescriptor, ResponseInfo};

/// Observer for outgoing requests, successful responses and final errors.
///
/// Every method defaults to a no-op so implementors override only what they need.
pub trait LoggingSink: Send + Sync {
    /// Called once per call, before the first attempt is sent.
    fn log_request(&self, _request: &RequestDescriptor) {}

    /// Called once per call, after the response passed the success-status check.
    fn log_response(&self, _response: &ResponseInfo) {}

    /// Called once per call, at the point of final failure.
    fn log_error(&self, _error: &EfetchError) {}
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LoggingSink for NoopSink {}

/// Default sink: emits `tracing` events under the `efetch` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl LoggingSink for ConsoleSink {
    fn log_request(&self, request: &RequestDescriptor) {
        tracing::info!(
            target: "efetch",
            method = %request.method,
            url = %request.url,
            headers = %format_headers(&request.headers),
            has_body = request.body.is_some(),
            "request"
        );
    }

    fn log_response(&self, response: &ResponseInfo) {
        tracing::info!(
            target: "efetch",
            method = %response.method,
            url = %response.url,
            status = response.status.as_u16(),
            retries = response.retries,
            body_len = response.body_len,
            headers = %format_headers(&response.headers),
            "response"
        );
    }

    fn log_error(&self, error: &EfetchError) {
        tracing::error!(target: "efetch", error = %error, "request failed");
    }
}

pub(crate) fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                "<redacted>"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{name}: {value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
