//! `efetch` is a typed async HTTP client helper.
//!
//! An [`EfetchClient`] joins a base URL with an endpoint, optional identifier and
//! query parameters, sends JSON bodies with lower-cased struct field names, decodes
//! responses with case-insensitive field matching and retries per a [`RetryPolicy`]:
//! - [`EfetchClient::get`]
//! - [`EfetchClient::post`]
//! - [`EfetchClient::put`]
//! - [`EfetchClient::patch`]
//! - [`EfetchClient::delete`]
//!
//! Requests, successful responses and final errors are reported to a [`LoggingSink`].
//!
//! Only struct fields are renamed on write; map keys are sent as given. On read,
//! struct fields and externally tagged enum variants match ignoring ASCII case.
//! `#[serde(flatten)]` fields, internally tagged and untagged enums are buffered by
//! serde before they reach the decoder and therefore need exact-case keys.

mod client;
mod config;
mod decode;
mod error;
mod lowercase;
mod params;
mod retry;
mod sink;
mod types;
mod url;
mod value;

pub use client::EfetchClient;
pub use config::{exponential_seconds, ClientConfig, RetryInterval};
pub use error::EfetchError;
pub use params::RequestOptions;
pub use retry::{AttemptFailure, NoRetry, NotFoundOrConnectRetry, RetryPolicy};
pub use sink::{ConsoleSink, LoggingSink, NoopSink};
pub use types::{RequestDescriptor, ResponseInfo};
pub use url::combine;
pub use value::Id;

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, EfetchError>;
