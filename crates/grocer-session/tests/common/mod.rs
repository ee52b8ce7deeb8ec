//! In-process stand-in for the dashboard backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grocer_auth::TokenStore;
use grocer_data::{ApiRequest, Response, ScriptedTransport};
use grocer_session::{
    ApiClient, HttpAuthBackend, Navigator, RefreshCoordinator, SessionManager,
};
use serde_json::json;

/// Backend state: which token is currently valid and how refreshes behave.
pub struct FakeApi {
    valid_token: Mutex<String>,
    issued: AtomicUsize,
    refresh_fails: AtomicBool,
    refresh_delay: Duration,
    pub rejected: AtomicUsize,
}

impl FakeApi {
    pub fn new(valid_token: &str, refresh_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            valid_token: Mutex::new(valid_token.to_string()),
            issued: AtomicUsize::new(1),
            refresh_fails: AtomicBool::new(false),
            refresh_delay,
            rejected: AtomicUsize::new(0),
        })
    }

    pub fn fail_refreshes(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    /// Invalidate every token handed out so far.
    pub fn expire_tokens(&self) {
        *self.valid_token.lock().unwrap() = "expired".to_string();
    }

    pub fn valid_token(&self) -> String {
        self.valid_token.lock().unwrap().clone()
    }

    async fn handle(&self, req: ApiRequest) -> Result<Response, grocer_data::FetchError> {
        match req.route() {
            "/auth/login" => self.login(&req),
            "/auth/refresh" => {
                tokio::time::sleep(self.refresh_delay).await;
                if self.refresh_fails.load(Ordering::SeqCst) {
                    return Response::json_body(401, &json!({"message": "session expired"}));
                }
                let token = self.issue();
                Response::json_body(200, &json!({ "token": token }))
            }
            "/auth/logout" => Ok(Response::empty(204)),
            _ => {
                if req.bearer_token() == Some(self.valid_token().as_str()) {
                    Response::json_body(200, &json!({"path": req.route(), "items": []}))
                } else {
                    self.rejected.fetch_add(1, Ordering::SeqCst);
                    Response::json_body(401, &json!({"message": "token expired"}))
                }
            }
        }
    }

    fn login(&self, req: &ApiRequest) -> Result<Response, grocer_data::FetchError> {
        let body: serde_json::Value =
            serde_json::from_slice(req.body_bytes().unwrap_or_default()).unwrap_or_default();
        let role = match (body["identifier"].as_str(), body["credential"].as_str()) {
            (Some("root"), Some("pw")) => "ADMIN",
            (Some("ana"), Some("pw")) => "SUB_ADMIN",
            _ => return Response::json_body(401, &json!({"message": "Invalid email or password"})),
        };
        let token = self.issue();
        Response::json_body(
            200,
            &json!({
                "token": token,
                "role": role,
                "username": body["identifier"],
                "profile": {"name": body["identifier"], "status": "ACTIVE"}
            }),
        )
    }

    fn issue(&self) -> String {
        let token = format!("t{}", self.issued.fetch_add(1, Ordering::SeqCst) + 1);
        *self.valid_token.lock().unwrap() = token.clone();
        token
    }
}

/// Everything a test needs, wired over the fake backend.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub transport: Arc<ScriptedTransport>,
    pub session: Arc<SessionManager>,
    pub client: Arc<ApiClient>,
}

impl Harness {
    pub fn new(api: Arc<FakeApi>, store: TokenStore) -> Self {
        let transport = Arc::new(ScriptedTransport::new({
            let api = api.clone();
            move |req| {
                let api = api.clone();
                Box::pin(async move { api.handle(req).await })
            }
        }));
        let backend = Arc::new(HttpAuthBackend::new(transport.clone()));
        let session = Arc::new(SessionManager::new(store, backend));
        let coordinator = Arc::new(RefreshCoordinator::new(session.clone()));
        let client = Arc::new(ApiClient::new(
            transport.clone(),
            session.clone(),
            coordinator,
        ));
        Self {
            api,
            transport,
            session,
            client,
        }
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(
            self.session.clone(),
            grocer_auth::RouteGuard::default(),
            grocer_auth::RouteTable::dashboard(),
        )
    }
}
