//! Transports that put requests on the wire.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::{ApiRequest, FetchError, Response, TimeoutConfig};

/// Sends requests to the backend.
///
/// A transport returns `Ok` for every HTTP response, whatever its status;
/// `Err` is reserved for requests that never produced a response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request.
    async fn send(&self, request: ApiRequest) -> Result<Response, FetchError>;

    /// Value of a cookie currently held for the backend, if any.
    fn cookie(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Transport backed by `reqwest` with a cookie jar.
///
/// The jar carries the backend's session cookie (used by the refresh
/// endpoint) and its anti-forgery cookie.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl HttpTransport {
    /// Create a transport for `base_url`.
    pub fn new(base_url: &str, timeouts: &TimeoutConfig) -> Result<Self, FetchError> {
        let base_url = parse_base_url(base_url)?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.response)
            .timeout(timeouts.total)
            .build()
            .map_err(|e| FetchError::RequestError(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path to a full URL.
    pub fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Cookies held for the backend, as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Put cookies from a `Cookie` header value back into the jar.
    pub fn restore_cookies(&self, header: &str) {
        for (name, value) in parse_cookie_header(header) {
            self.jar
                .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.base_url);
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Response, FetchError> {
        let url = self.url_for(&request.path)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.into(), url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        tracing::debug!(status, "response received");
        Ok(Response::new(status, headers, body))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.cookie_header()?;
        parse_cookie_header(&header).remove(name)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::RequestError(e.to_string())
    }
}

/// Parse a base URL, making sure it ends with a slash so joins keep its path.
fn parse_base_url(base_url: &str) -> Result<Url, FetchError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))
}

/// Split a `Cookie` header value into name/value pairs.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, &TimeoutConfig::default()).unwrap()
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let t = transport("https://api.grocer.example/v1");
        assert_eq!(
            t.url_for("/products?page=2").unwrap().as_str(),
            "https://api.grocer.example/v1/products?page=2"
        );
        assert_eq!(
            t.url_for("auth/login").unwrap().as_str(),
            "https://api.grocer.example/v1/auth/login"
        );
    }

    #[test]
    fn test_url_for_absolute() {
        let t = transport("https://api.grocer.example/v1/");
        assert_eq!(
            t.url_for("https://cdn.grocer.example/x.png").unwrap().as_str(),
            "https://cdn.grocer.example/x.png"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url", &TimeoutConfig::default()),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("session=abc; csrf_token=x=y ;bad; =v");
        assert_eq!(cookies.get("session").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("csrf_token").map(String::as_str), Some("x=y"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_cookie_lookup_and_restore() {
        let t = transport("http://localhost:8080");
        assert_eq!(t.cookie("csrf_token"), None);

        t.restore_cookies("csrf_token=tok123; session=s1");
        assert_eq!(t.cookie("csrf_token").as_deref(), Some("tok123"));
        assert_eq!(t.cookie("session").as_deref(), Some("s1"));

        let restored = transport("http://localhost:8080");
        restored.restore_cookies(&t.cookie_header().unwrap());
        assert_eq!(restored.cookie("session").as_deref(), Some("s1"));
    }
}
