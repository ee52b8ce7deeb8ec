//! Late-result handling for views that can go away.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifetime marker for a view that issues requests.
///
/// Requests are never cancelled. When the view closes, results that arrive
/// afterwards are dropped instead of being delivered.
#[derive(Debug, Clone)]
pub struct ViewScope {
    name: Arc<str>,
    open: Arc<AtomicBool>,
}

impl ViewScope {
    /// Open a scope for the named view.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// View name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the scope. Every clone observes it.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Whether the view is still around.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Deliver `value` only if the scope is still open.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        if self.is_open() {
            Some(value)
        } else {
            tracing::debug!(view = %self.name, "discarding result for closed view");
            None
        }
    }

    /// Run `future` to completion and deliver its output only if the scope
    /// is still open by then.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        let output = future.await;
        self.accept(output)
    }
}
