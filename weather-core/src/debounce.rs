//! Debounced search scheduling.
//!
//! Each accepted keystroke replaces the pending search: the previous task is
//! aborted (whether still waiting out the quiet period or already talking to
//! the provider) and a new one starts its own timer. Queries shorter than the
//! minimum length never reach the provider.
//!
//! ```ignore
//! let mut debouncer = SearchDebouncer::new(Duration::from_millis(500), 3);
//! debouncer.schedule("Lon", |query| async move {
//!     let results = gateway.search_locations(&query).await;
//!     apply(results);
//! });
//! debouncer.cancel();
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;

/// What `schedule` did with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// A search will fire after the quiet period unless superseded.
    Pending,
    /// The query was too short; any pending search was dropped.
    TooShort,
    /// The search is closed or the session is over; nothing was scheduled.
    Closed,
}

#[derive(Debug)]
pub struct SearchDebouncer {
    quiet_period: Duration,
    min_query_chars: usize,
    pending: Option<AbortHandle>,
}

impl SearchDebouncer {
    pub fn new(quiet_period: Duration, min_query_chars: usize) -> Self {
        Self {
            quiet_period,
            min_query_chars,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replace the pending search with one for `query`.
    ///
    /// `fire` receives the trimmed query once the quiet period has elapsed.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, query: &str, fire: F) -> Scheduled
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let query = query.trim();
        if query.chars().count() < self.min_query_chars {
            return Scheduled::TooShort;
        }

        let query = query.to_string();
        let quiet_period = self.quiet_period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            fire(query).await;
        });

        self.pending = Some(handle.abort_handle());
        Scheduled::Pending
    }

    /// Drop the pending search, if any. Its callback will not run, and if
    /// it is already running it is stopped at its next await point.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD, DEFAULT_MIN_QUERY_CHARS)
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
