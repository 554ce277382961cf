use std::{fmt, future::Future, sync::Arc, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    decode::{decode_body, encode_body},
    retry::{AttemptFailure, NotFoundOrConnectRetry, RetryPolicy},
    sink::{format_headers, ConsoleSink, LoggingSink},
    url::combine,
    ClientConfig, EfetchError, RequestDescriptor, RequestOptions, ResponseInfo, Result,
};

/// Typed JSON client bound to a base URL.
///
/// Cloning is cheap: the connection pool, retry policy and sink are shared.
#[derive(Clone)]
pub struct EfetchClient {
    http: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    retry: Arc<dyn RetryPolicy>,
    sink: Arc<dyn LoggingSink>,
}

impl fmt::Debug for EfetchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EfetchClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &format_headers(&self.default_headers))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.retry.max_retries())
            .finish_non_exhaustive()
    }
}

struct Completed {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    retries: usize,
}

impl EfetchClient {
    /// Builds a client that logs through [`ConsoleSink`] and retries per `config`.
    ///
    /// Fails if the transport cannot be constructed or a default header is invalid.
    /// Default headers with a blank name or value are skipped.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(EfetchError::Client)?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            if name.trim().is_empty() || value.trim().is_empty() {
                continue;
            }
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        Ok(Self {
            http,
            retry: Arc::new(NotFoundOrConnectRetry::from_config(&config)),
            base_url: config.base_url,
            default_headers,
            timeout: config.timeout,
            sink: Arc::new(ConsoleSink),
        })
    }

    /// Replaces the logging sink.
    pub fn with_sink(mut self, sink: impl LoggingSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Replaces the logging sink with a shared one.
    pub fn with_shared_sink(mut self, sink: Arc<dyn LoggingSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the retry policy derived from the config.
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Arc::new(policy);
        self
    }

    /// Base URL every endpoint is joined onto, as configured.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET request and decodes the response into `T`.
    pub async fn get<T, O>(&self, endpoint: &str, options: O) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        O: Into<RequestOptions>,
    {
        self.send::<T, (), O>(Method::GET, endpoint, None, options)
            .await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send(Method::POST, endpoint, Some(body), options).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send(Method::PUT, endpoint, Some(body), options).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch<T, B, O>(&self, endpoint: &str, body: &B, options: O) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        self.send(Method::PATCH, endpoint, Some(body), options).await
    }

    /// Sends a DELETE request.
    pub async fn delete<T, O>(&self, endpoint: &str, options: O) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        O: Into<RequestOptions>,
    {
        self.send::<T, (), O>(Method::DELETE, endpoint, None, options)
            .await
    }

    /// Sends a request with any method and an optional JSON body.
    ///
    /// Errors are reported to the sink once, after retries are exhausted.
    pub async fn send<T, B, O>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: O,
    ) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        B: Serialize + ?Sized,
        O: Into<RequestOptions>,
    {
        let options = options.into();
        let result = self.execute(method, endpoint, body, &options).await;
        if let Err(err) = &result {
            self.sink.log_error(err);
        }
        result
    }

    async fn execute<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        B: Serialize + ?Sized,
    {
        let cancel = options.cancel.as_ref();
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(EfetchError::Cancelled);
        }

        let request = self.prepare(method, endpoint, body, options)?;
        self.sink.log_request(&request);

        let completed = self.send_with_retry(&request, cancel).await?;
        self.sink.log_response(&ResponseInfo {
            method: request.method.clone(),
            url: request.url.clone(),
            status: completed.status,
            headers: completed.headers,
            retries: completed.retries,
            body_len: completed.body.len(),
        });

        decode_body(completed.body)
    }

    fn prepare<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor>
    where
        B: Serialize + ?Sized,
    {
        let url = combine(&self.base_url, endpoint, options.id.as_ref(), &options.query);
        reqwest::Url::parse(&url).map_err(|err| EfetchError::InvalidUrl {
            url: url.clone(),
            message: err.to_string(),
        })?;

        let body = body.map(|body| encode_body(body)).transpose()?;

        let mut headers = self.default_headers.clone();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &options.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        Ok(RequestDescriptor {
            method,
            url,
            headers,
            body,
        })
    }

    async fn send_with_retry(
        &self,
        request: &RequestDescriptor,
        cancel: Option<&CancellationToken>,
    ) -> Result<Completed> {
        let max_retries = self.retry.max_retries();
        let mut attempt = 0usize;
        loop {
            match cancellable(cancel, self.attempt(request)).await? {
                Ok((status, headers, body)) => {
                    if status.is_success() {
                        return Ok(Completed {
                            status,
                            headers,
                            body,
                            retries: attempt,
                        });
                    }

                    if attempt < max_retries
                        && self.retry.should_retry(&AttemptFailure::Status(status))
                    {
                        self.wait_before_retry(attempt, cancel).await?;
                        attempt += 1;
                        continue;
                    }

                    return Err(status_error(status, &request.url, body));
                }
                Err(err) => {
                    if attempt < max_retries
                        && self.retry.should_retry(&AttemptFailure::Transport(&err))
                    {
                        self.wait_before_retry(attempt, cancel).await?;
                        attempt += 1;
                        continue;
                    }
                    return Err(EfetchError::Connection(err));
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<(StatusCode, HeaderMap, String), reqwest::Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok((status, headers, body))
    }

    async fn wait_before_retry(
        &self,
        attempt: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let delay = self.retry.delay(attempt);
        tracing::debug!(
            target: "efetch",
            retry = attempt + 1,
            "retrying request after {} ms",
            delay.as_millis()
        );
        cancellable(cancel, tokio::time::sleep(delay)).await
    }
}

/// Runs `fut` unless `cancel` fires first.
async fn cancellable<F>(cancel: Option<&CancellationToken>, fut: F) -> Result<F::Output>
where
    F: Future,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(EfetchError::Cancelled),
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}

fn status_error(status: StatusCode, url: &str, body: String) -> EfetchError {
    if status == StatusCode::NOT_FOUND {
        EfetchError::NotFound {
            url: url.to_owned(),
            body,
        }
    } else {
        EfetchError::Http {
            status: status.as_u16(),
            body,
        }
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name =
        HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| EfetchError::InvalidHeader {
            name: name.to_owned(),
            message: err.to_string(),
        })?;
    let header_value =
        HeaderValue::from_str(value.trim()).map_err(|err| EfetchError::InvalidHeader {
            name: name.to_owned(),
            message: err.to_string(),
        })?;
    Ok((header_name, header_value))
}
