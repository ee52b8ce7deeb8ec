//! HTTP request/response types and transports for the Grocer admin client.
//!
//! Requests are described with [`ApiRequest`] and handed to a [`Transport`].
//! [`HttpTransport`] talks to the real backend through `reqwest`;
//! [`ScriptedTransport`] answers from a closure for tests and demos.
//!
//! # Example
//!
//! ```rust,ignore
//! use grocer_data::{ApiRequest, HttpTransport, TimeoutConfig, Transport};
//!
//! let transport = HttpTransport::new("https://api.grocer.example/v1", &TimeoutConfig::default())?;
//! let riders: Vec<Rider> = transport
//!     .send(ApiRequest::get("/riders").bearer_auth(token))
//!     .await?
//!     .error_for_status()?
//!     .json()?;
//! ```

mod error;
mod request;
mod response;
mod scripted;
mod timeout;
mod transport;

pub use error::FetchError;
pub use request::{ApiRequest, Method};
pub use response::Response;
pub use scripted::ScriptedTransport;
pub use timeout::TimeoutConfig;
pub use transport::{parse_cookie_header, HttpTransport, Transport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ApiRequest, FetchError, Method, Response, Transport};
}
