//! Single-flight token refresh.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grocer_data::FetchError;
use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::manager::SessionManager;

type Waiter = oneshot::Sender<Result<String, FetchError>>;

enum State {
    Idle,
    /// A refresh call is in flight; waiters are in arrival order.
    Refreshing { waiters: Vec<Waiter> },
}

/// Collapses concurrent refresh requests into one backend call.
///
/// The first caller to ask for a refresh while idle issues the refresh call.
/// Everyone arriving while it is in flight is queued and receives the same
/// outcome once it completes:
///
/// - on success the session's token is replaced, then every waiter gets the
///   new token in arrival order;
/// - on failure the session is force-logged-out, then every waiter gets
///   [`ClientError::RefreshFailed`].
///
/// The state lock is never held across an `.await`.
pub struct RefreshCoordinator {
    session: Arc<SessionManager>,
    state: Mutex<State>,
    refreshes: AtomicUsize,
}

impl RefreshCoordinator {
    /// Create a coordinator refreshing through `session`'s backend.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            state: Mutex::new(State::Idle),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Obtain a new token, joining the in-flight refresh if there is one.
    pub async fn refresh(&self) -> Result<String, ClientError> {
        let (tx, rx) = oneshot::channel();

        let leader = {
            let mut state = self.lock();
            match &mut *state {
                State::Idle => {
                    *state = State::Refreshing { waiters: vec![tx] };
                    true
                }
                State::Refreshing { waiters } => {
                    waiters.push(tx);
                    tracing::debug!(queued = waiters.len(), "joined in-flight refresh");
                    false
                }
            }
        };

        if leader {
            self.run().await;
        }

        match rx.await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(e)) => Err(ClientError::RefreshFailed(e)),
            Err(_) => Err(ClientError::RefreshFailed(FetchError::RequestError(
                "refresh was abandoned".to_string(),
            ))),
        }
    }

    /// Whether a refresh call is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), State::Refreshing { .. })
    }

    /// Number of refresh calls issued so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(refresh = count, "refreshing session token");

        // Rejects the queue if this future is dropped mid-refresh.
        let mut abandon = AbandonGuard {
            coordinator: self,
            armed: true,
        };
        let outcome = self.session.backend().refresh().await;
        abandon.armed = false;

        match &outcome {
            Ok(token) => {
                self.session.apply_refreshed_token(token);
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, signing out");
                self.session.force_logout();
            }
        }

        let waiters = self.take_waiters();
        tracing::debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "refresh settled"
        );
        for waiter in waiters {
            // A waiter whose caller went away is fine to skip.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Return to idle, handing back whoever was queued.
    fn take_waiters(&self) -> Vec<Waiter> {
        match std::mem::replace(&mut *self.lock(), State::Idle) {
            State::Idle => Vec::new(),
            State::Refreshing { waiters } => waiters,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("refresh_count", &self.refresh_count())
            .finish()
    }
}

struct AbandonGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let waiters = self.coordinator.take_waiters();
        tracing::warn!(waiters = waiters.len(), "refresh dropped before completing");
        for waiter in waiters {
            let _ = waiter.send(Err(FetchError::RequestError(
                "refresh was abandoned".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use async_trait::async_trait;
    use grocer_auth::{Identity, LoginCredentials, Profile, Role, TokenStore};
    use tokio::sync::Notify;

    use super::*;
    use crate::backend::AuthBackend;

    /// Backend whose refresh blocks until released.
    struct GatedBackend {
        release: Notify,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl GatedBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                release: Notify::new(),
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AuthBackend for GatedBackend {
        async fn login(&self, _: &LoginCredentials) -> Result<Identity, ClientError> {
            unreachable!("login is not used here")
        }

        async fn refresh(&self) -> Result<String, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.release.notified().await;
            if self.fail.load(Ordering::SeqCst) {
                Err(FetchError::HttpError {
                    status: 401,
                    message: "session expired".to_string(),
                })
            } else {
                Ok(format!("t{}", n + 1))
            }
        }

        async fn logout(&self, _: Option<&str>) -> Result<(), FetchError> {
            Ok(())
        }
    }

    fn setup(backend: Arc<GatedBackend>) -> (Arc<SessionManager>, Arc<RefreshCoordinator>) {
        let store = TokenStore::in_memory();
        store
            .save(&Identity::new("t1", Role::Admin, "root", Profile::default()))
            .unwrap();
        let session = Arc::new(SessionManager::new(store, backend));
        let coordinator = Arc::new(RefreshCoordinator::new(session.clone()));
        (session, coordinator)
    }

    async fn wait_until_refreshing(coordinator: &RefreshCoordinator) {
        while !coordinator.is_refreshing() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let backend = GatedBackend::new();
        let (session, coordinator) = setup(backend.clone());

        let leader = tokio::spawn({
            let c = coordinator.clone();
            async move { c.refresh().await }
        });
        wait_until_refreshing(&coordinator).await;

        let followers: Vec<_> = (0..5)
            .map(|_| {
                let c = coordinator.clone();
                tokio::spawn(async move { c.refresh().await })
            })
            .collect();
        // Let the followers enqueue before releasing the refresh.
        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.release.notify_one();

        assert_eq!(leader.await.unwrap().unwrap(), "t2");
        for follower in followers {
            assert_eq!(follower.await.unwrap().unwrap(), "t2");
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.refresh_count(), 1);
        assert!(!coordinator.is_refreshing());
        assert_eq!(session.token().as_deref(), Some("t2"));
        assert_eq!(session.store().load().unwrap().token, "t2");
    }

    #[tokio::test]
    async fn test_failure_rejects_everyone_and_logs_out() {
        let backend = GatedBackend::new();
        backend.fail.store(true, Ordering::SeqCst);
        let (session, coordinator) = setup(backend.clone());

        let leader = tokio::spawn({
            let c = coordinator.clone();
            async move { c.refresh().await }
        });
        wait_until_refreshing(&coordinator).await;
        let follower = tokio::spawn({
            let c = coordinator.clone();
            async move { c.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.release.notify_one();

        for handle in [leader, follower] {
            match handle.await.unwrap() {
                Err(ClientError::RefreshFailed(e)) => assert_eq!(e.status(), Some(401)),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert!(!session.is_authenticated());
        assert_eq!(session.store().load(), None);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_call_backend() {
        let backend = GatedBackend::new();
        let (_session, coordinator) = setup(backend.clone());

        for expected in ["t2", "t3"] {
            let handle = tokio::spawn({
                let c = coordinator.clone();
                async move { c.refresh().await }
            });
            wait_until_refreshing(&coordinator).await;
            backend.release.notify_one();
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
        assert_eq!(coordinator.refresh_count(), 2);
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_waiters() {
        let backend = GatedBackend::new();
        let (_session, coordinator) = setup(backend.clone());

        let leader = tokio::spawn({
            let c = coordinator.clone();
            async move { c.refresh().await }
        });
        wait_until_refreshing(&coordinator).await;
        let follower = tokio::spawn({
            let c = coordinator.clone();
            async move { c.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        leader.abort();
        let outcome = follower.await.unwrap();
        assert!(matches!(outcome, Err(ClientError::RefreshFailed(_))));
        assert!(!coordinator.is_refreshing());
    }
}
