//! Scripted transport for tests and offline demos.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::{ApiRequest, FetchError, Response, Transport};

type Handler = Box<dyn Fn(ApiRequest) -> BoxFuture<'static, Result<Response, FetchError>> + Send + Sync>;

/// Transport that answers every request with a user-supplied async handler
/// and records what was sent.
///
/// ```rust,ignore
/// let transport = ScriptedTransport::new(|req| {
///     Box::pin(async move {
///         match req.route() {
///             "/auth/refresh" => Response::json_body(200, &json!({"token": "t2"})),
///             _ => Ok(Response::empty(200)),
///         }
///     })
/// });
/// ```
pub struct ScriptedTransport {
    handler: Handler,
    sent: Mutex<Vec<ApiRequest>>,
    cookies: Mutex<HashMap<String, String>>,
}

impl ScriptedTransport {
    /// Create a transport answering with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ApiRequest) -> BoxFuture<'static, Result<Response, FetchError>> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
            cookies: Mutex::new(HashMap::new()),
        }
    }

    /// Set a cookie visible through [`Transport::cookie`].
    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut cookies) = self.cookies.lock() {
            cookies.insert(name.into(), value.into());
        }
    }

    /// Every request sent so far, in send order.
    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Requests sent to `route` (path without query).
    pub fn sent_to(&self, route: &str) -> Vec<ApiRequest> {
        self.sent()
            .into_iter()
            .filter(|r| r.route() == route)
            .collect()
    }

    /// Number of requests sent to `route`.
    pub fn count(&self, route: &str) -> usize {
        self.sent_to(route).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Response, FetchError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
        (self.handler)(request).await
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().ok()?.get(name).cloned()
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("sent", &self.sent().len())
            .finish_non_exhaustive()
    }
}
