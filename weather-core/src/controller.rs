//! Forecast workflow controller.
//!
//! Owns the session's [`WorkflowState`] and turns the three inputs (startup,
//! search text, picked location) into gateway and store calls. Observers
//! read the state through a `watch` channel; every mutation goes through
//! `send_if_modified`, so updates are applied one at a time.
//!
//! Every forecast fetch takes a sequence number before it starts. When it
//! completes, its result is only applied if no newer fetch has started since,
//! so a slow response can never overwrite a faster, later one.
//!
//! Writes of the last city run on detached tasks. They are serialized and
//! tagged with the fetch sequence of their pick, so an older pick can never
//! land after a newer one. [`WorkflowController::flush`] waits for them.

use parking_lot::Mutex;
use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::WorkflowSettings,
    debounce::{Scheduled, SearchDebouncer},
    gateway::WeatherGateway,
    model::{ForecastSnapshot, LocationCandidate, WorkflowState},
    store::LastLocationStore,
};

#[derive(Debug)]
struct Inner {
    gateway: Arc<dyn WeatherGateway>,
    store: Arc<dyn LastLocationStore>,
    settings: WorkflowSettings,
    state: watch::Sender<WorkflowState>,
    fetch_seq: AtomicU64,
    search_seq: AtomicU64,
    debouncer: Mutex<SearchDebouncer>,
    disposed: AtomicBool,
    /// Fetch sequence of the newest pick written to the store.
    persisted_seq: Arc<tokio::sync::Mutex<u64>>,
    persist_tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Cheap to clone; clones share the same session.
#[derive(Debug, Clone)]
pub struct WorkflowController {
    inner: Arc<Inner>,
}

impl WorkflowController {
    pub fn new(
        gateway: Arc<dyn WeatherGateway>,
        store: Arc<dyn LastLocationStore>,
        settings: WorkflowSettings,
    ) -> Self {
        let debouncer =
            SearchDebouncer::new(settings.search_quiet_period, settings.min_query_chars);
        let (state, _) = watch::channel(WorkflowState::default());

        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                settings,
                state,
                fetch_seq: AtomicU64::new(0),
                search_seq: AtomicU64::new(0),
                debouncer: Mutex::new(debouncer),
                disposed: AtomicBool::new(false),
                persisted_seq: Arc::default(),
                persist_tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> WorkflowState {
        self.inner.state.borrow().clone()
    }

    /// Restore the last city (or the default) and load its forecast.
    pub async fn start(&self) {
        let seq = self.begin_fetch();

        let city = match self.inner.store.get().await {
            Some(city) => city,
            None => {
                tracing::info!(
                    city = %self.inner.settings.default_city,
                    "no saved city, using default"
                );
                self.inner.settings.default_city.clone()
            }
        };

        let snapshot = self.fetch(&city).await;
        self.finish_fetch(seq, snapshot);
    }

    pub fn toggle_search(&self) {
        let open = !self.inner.state.borrow().search_open;
        self.set_search_open(open);
    }

    /// Closing the search drops its candidates and any pending query.
    pub fn set_search_open(&self, open: bool) {
        if !open {
            self.inner.debouncer.lock().cancel();
            self.inner.search_seq.fetch_add(1, Ordering::SeqCst);
        }

        self.inner.state.send_if_modified(|s| {
            let changed = s.search_open != open
                || (!open && (s.searching || !s.candidates.is_empty()));
            s.search_open = open;
            if !open {
                s.searching = false;
                s.candidates.clear();
            }
            changed
        });
    }

    /// Route search text through the debouncer.
    ///
    /// Once the quiet period passes, the candidates are replaced with the
    /// search results, as long as the search is still open and no newer
    /// query has fired in the meantime. `loading` is never touched; the
    /// `searching` flag covers the wait instead. Text typed while the search
    /// is closed is ignored.
    pub fn text_changed(&self, value: &str) -> Scheduled {
        if self.is_disposed() || !self.inner.state.borrow().search_open {
            return Scheduled::Closed;
        }

        self.set_searching(true);
        let inner = Arc::downgrade(&self.inner);
        let scheduled = self
            .inner
            .debouncer
            .lock()
            .schedule(value, move |query| run_search(inner, query));

        if scheduled != Scheduled::Pending {
            self.set_searching(false);
        }
        scheduled
    }

    /// Confirm a candidate: close the search, load its forecast and remember
    /// it for the next session.
    ///
    /// The city is written to the store by a detached task; a failed write
    /// is logged and does not affect the displayed forecast.
    pub async fn location_picked(&self, candidate: &LocationCandidate) {
        self.set_search_open(false);
        let seq = self.begin_fetch();
        tracing::info!(city = %candidate.name, seq, "location picked");

        let snapshot = self.fetch(&candidate.name).await;
        if self.finish_fetch(seq, snapshot) {
            self.persist(seq, candidate.name.clone());
        }
    }

    /// Re-fetch the forecast for the city currently on display.
    pub async fn refresh(&self) {
        let city = match &self.inner.state.borrow().snapshot {
            Some(snapshot) => snapshot.location.name.clone(),
            None => return,
        };

        let seq = self.begin_fetch();
        let snapshot = self.fetch(&city).await;
        self.finish_fetch(seq, snapshot);
    }

    /// End the session: the pending search is cancelled and results that
    /// arrive afterwards are dropped.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.debouncer.lock().cancel();
        self.set_searching(false);
        tracing::debug!("workflow controller disposed");
    }

    /// Wait until every write of the last city started so far has finished.
    pub async fn flush(&self) {
        let tasks = std::mem::take(&mut *self.inner.persist_tasks.lock());
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "last-city write task failed");
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn set_searching(&self, searching: bool) {
        self.inner.state.send_if_modified(|s| {
            let changed = s.searching != searching;
            s.searching = searching;
            changed
        });
    }

    fn begin_fetch(&self) -> u64 {
        let seq = self.inner.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_if_modified(|s| {
            let changed = !s.loading;
            s.loading = true;
            changed
        });
        seq
    }

    async fn fetch(&self, city: &str) -> Option<ForecastSnapshot> {
        self.inner
            .gateway
            .fetch_forecast(city, self.inner.settings.forecast_days)
            .await
    }

    /// Apply the outcome of fetch `seq`. Returns `false` when a newer fetch
    /// has started (or the session is over) and the outcome was discarded.
    fn finish_fetch(&self, seq: u64, snapshot: Option<ForecastSnapshot>) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut applied = false;
        self.inner.state.send_if_modified(|s| {
            if self.inner.fetch_seq.load(Ordering::SeqCst) != seq {
                tracing::debug!(seq, "discarding superseded forecast");
                return false;
            }
            applied = true;
            s.loading = false;
            match snapshot {
                Some(snapshot) => s.snapshot = Some(snapshot),
                None => tracing::info!(seq, "forecast unavailable, keeping previous snapshot"),
            }
            true
        });
        applied
    }

    fn persist(&self, seq: u64, city: String) {
        let store = self.inner.store.clone();
        let persisted_seq = self.inner.persisted_seq.clone();
        let task = tokio::spawn(async move {
            let mut persisted_seq = persisted_seq.lock().await;
            if *persisted_seq >= seq {
                tracing::debug!(%city, seq, "newer city already written");
                return;
            }
            if let Err(err) = store.put(&city).await {
                tracing::warn!(%city, error = %err, "failed to remember last city");
            }
            *persisted_seq = seq;
        });

        let mut tasks = self.inner.persist_tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }
}

/// Body of a debounced search. Holds the session weakly while waiting, so
/// dropping every controller handle cancels it.
async fn run_search(inner: Weak<Inner>, query: String) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let seq = inner.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
    let candidates = inner.gateway.search_locations(&query).await;
    tracing::debug!(%query, found = candidates.len(), "location search finished");

    if inner.disposed.load(Ordering::SeqCst) {
        return;
    }
    inner.state.send_if_modified(|s| {
        if !s.search_open || inner.search_seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        s.candidates = candidates;
        s.searching = false;
        true
    });
}
