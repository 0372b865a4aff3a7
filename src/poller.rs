//! Periodic fetch, merge and classification.
//!
//! The [`Poller`] owns the canonical [`MessageList`] and is its only writer.
//! Each tick builds a filter, awaits the [`MessageSource`], then merges and
//! classifies under one short lock so observers never see a half-merged
//! list. At most one fetch is in flight; ticks that arrive meanwhile are
//! dropped.
//!
//! ```text
//!            start()
//!               │
//!   ┌──────▶ Idle ──tick──▶ FetchInFlight ──ok──▶ merge + classify ──┐
//!   │           ▲                │                                   │
//!   │           │               err ──▶ display_error                │
//!   │           └────────────────┴───────────────────────────────────┘
//!   │
//!   └── stop() ──▶ Stopped (pending results discarded)
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::data::{HighWaterMark, MergeSummary, MessageList};
use crate::presenter::{Board, Presenter};
use crate::source::{
    FilterProvider, MessageFilter, MessageSource, SourceError, TopicProvider, TopicSettings,
};

const DEFAULT_TREE_VIEW: &str = "notree";

/// Floor for the timer period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Merged a batch into the canonical list.
    Applied(MergeSummary),
    /// Another fetch was in flight.
    Skipped,
    /// The poller was stopped or reset while this tick ran.
    Stale,
    /// The fetch failed and was reported to the presenter.
    Failed(SourceError),
}

/// Mutable poll state, guarded by one lock that is never held across an await.
#[derive(Debug, Default)]
struct PollerState {
    messages: MessageList,
    mark: HighWaterMark,
    skip: usize,
    tree_view: String,
    settings: TopicSettings,
    /// Set while a fetch is outstanding, including one from an older generation
    loading: bool,
    initial_loading: bool,
    is_topic_rw: bool,
    /// Bumped by stop and reset; results of older ticks are discarded
    generation: u64,
}

struct Timer {
    task: JoinHandle<()>,
    runtime: Handle,
}

struct Inner {
    topic: String,
    source: Arc<dyn MessageSource>,
    filters: Arc<dyn FilterProvider>,
    topics: Arc<dyn TopicProvider>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<PollerState>,
    timer: Mutex<Option<Timer>>,
}

/// Drives the fetch cycle for one topic.
///
/// Cloning is cheap and every clone drives the same cycle.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

impl Poller {
    pub fn new(
        topic: impl Into<String>,
        source: Arc<dyn MessageSource>,
        filters: Arc<dyn FilterProvider>,
        topics: Arc<dyn TopicProvider>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let state = PollerState {
            tree_view: DEFAULT_TREE_VIEW.to_string(),
            initial_loading: true,
            ..PollerState::default()
        };
        Self {
            inner: Arc::new(Inner {
                topic: topic.into(),
                source,
                filters,
                topics,
                presenter,
                state: Mutex::new(state),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Use another tree view than `notree` for the following fetches.
    ///
    /// Applies to every clone of this poller.
    pub fn with_tree_view(self, tree_view: impl Into<String>) -> Self {
        self.inner.state.lock().tree_view = tree_view.into();
        self
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn source_description(&self) -> &str {
        self.inner.source.description()
    }

    pub fn is_running(&self) -> bool {
        self.inner.timer.lock().is_some()
    }

    /// Current high-water mark (next `dateMinUpdate`).
    pub fn high_water_mark(&self) -> Option<f64> {
        self.inner.state.lock().mark.get()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the topic's poll settings from the [`TopicProvider`].
    pub async fn load_settings(&self) -> Result<TopicSettings, SourceError> {
        let settings = self.inner.topics.settings(&self.inner.topic).await?;
        self.inner.state.lock().settings = settings;
        debug!(
            "Topic {} polls every {:?}, {} per page",
            self.inner.topic, settings.interval, settings.count
        );
        Ok(settings)
    }

    /// Load topic settings, fetch immediately, then fetch every interval.
    ///
    /// Calling `start` on a running poller does nothing.
    pub async fn start(&self) -> Result<(), SourceError> {
        if self.is_running() {
            return Ok(());
        }
        let settings = self.load_settings().await?;

        let mut timer = self.inner.timer.lock();
        if timer.is_some() {
            return Ok(());
        }
        info!(
            "Polling {} from {} every {:?}",
            self.inner.topic,
            self.inner.source.description(),
            settings.interval
        );
        *timer = Some(self.spawn_timer(Handle::current(), settings.interval));
        Ok(())
    }

    /// Cancel the schedule. Fetches already in flight are discarded.
    ///
    /// Idempotent.
    pub fn stop(&self) {
        let timer = self.inner.timer.lock().take();
        self.inner.state.lock().generation += 1;
        if let Some(timer) = timer {
            timer.task.abort();
            info!("Stopped polling {}", self.inner.topic);
        }
    }

    /// Full reset: clear the list, skip and high-water mark, then restart
    /// the cycle with an immediate fetch if the poller is running.
    ///
    /// A fetch still in flight keeps blocking new ones until it returns;
    /// its result is discarded and a fresh tick follows right away.
    pub fn refresh(&self) {
        let interval = {
            let mut state = self.inner.state.lock();
            state.messages.clear();
            state.mark.reset();
            state.skip = 0;
            state.initial_loading = true;
            state.generation += 1;
            self.inner.presenter.present(Board::default());
            state.settings.interval
        };
        info!("Refreshing {}", self.inner.topic);

        let mut timer = self.inner.timer.lock();
        if let Some(old) = timer.take() {
            old.task.abort();
            *timer = Some(self.spawn_timer(old.runtime, interval));
        }
    }

    /// Run one poll cycle now.
    pub async fn tick(&self) -> TickOutcome {
        let generation = self.inner.state.lock().generation;
        self.tick_for(generation).await
    }

    fn spawn_timer(&self, runtime: Handle, interval: Duration) -> Timer {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                "Poll interval {:?} for {} is too short, using {:?}",
                interval, self.inner.topic, MIN_INTERVAL
            );
            MIN_INTERVAL
        } else {
            interval
        };
        let generation = self.inner.state.lock().generation;
        let poller = self.clone();
        let spawner = runtime.clone();
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // The first tick completes immediately
                ticker.tick().await;
                let poller = poller.clone();
                spawner.spawn(async move {
                    poller.tick_for(generation).await;
                });
            }
        });
        Timer { task, runtime }
    }

    /// Tick the current generation now if the timer is running. Used once a
    /// discarded fetch releases the in-flight slot, so a reset does not wait
    /// a full interval for its first fetch.
    fn catch_up(&self) {
        let timer = self.inner.timer.lock();
        if let Some(timer) = timer.as_ref() {
            let poller = self.clone();
            timer.runtime.spawn(async move {
                poller.tick().await;
            });
        }
    }

    fn build_filter(&self, state: &PollerState) -> MessageFilter {
        let overlay = self.inner.filters.overlay();
        let date_min_update = if self.inner.filters.contains_date_filter() {
            None
        } else {
            state.mark.get()
        };
        MessageFilter {
            topic: self.inner.topic.clone(),
            tree_view: state.tree_view.clone(),
            only_msg_root: true,
            limit: state.settings.count,
            skip: state.skip,
            date_min_update,
            overlay,
        }
    }

    async fn tick_for(&self, generation: u64) -> TickOutcome {
        let filter = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return TickOutcome::Stale;
            }
            if state.loading {
                debug!("Messages list already in refresh, dropping tick");
                return TickOutcome::Skipped;
            }
            state.loading = true;
            self.build_filter(&state)
        };
        self.inner.presenter.set_loading(true);

        let result = self.inner.source.fetch(&filter).await;

        let mut state = self.inner.state.lock();
        state.loading = false;
        if state.generation != generation {
            drop(state);
            debug!("Discarding fetch started before a stop or reset");
            self.inner.presenter.set_loading(false);
            self.catch_up();
            return TickOutcome::Stale;
        }

        match result {
            Ok(batch) => {
                let state = &mut *state;
                state.is_topic_rw = batch.is_topic_rw;
                let summary = state.messages.merge(batch.messages, &mut state.mark);
                state.initial_loading = false;
                if !summary.is_empty() {
                    debug!(
                        "Merged {} new and {} updated messages, {} total",
                        summary.inserted,
                        summary.updated,
                        state.messages.len()
                    );
                }
                self.inner
                    .presenter
                    .present(Board::build(&state.messages, state.is_topic_rw));
                TickOutcome::Applied(summary)
            }
            Err(err) => {
                drop(state);
                warn!("Fetching {} failed: {}", self.inner.topic, err);
                self.inner.presenter.display_error(&err);
                self.inner.presenter.set_loading(false);
                TickOutcome::Failed(err)
            }
        }
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("topic", &self.inner.topic)
            .field("source", &self.inner.source)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.task.abort();
        }
    }
}
