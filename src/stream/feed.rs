//! Timer-driven telemetry publisher.
//!
//! Design goals:
//! - caller-owned state: each [`TelemetryFeed`] holds its own workbook
//!   snapshot and subscriber registry, nothing lives in module globals
//! - one timer slot: a feed runs at most one worker thread at a time;
//!   starting a second stream while one is live is a logged no-op
//! - prompt shutdown: workers block on a stop channel with a timeout equal
//!   to the tick interval, so `stop()` wakes them without waiting out a tick

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Days, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::{build_series_store, load_workbook, RandomMetrics, WorkbookSource};
use crate::domain::{
    FormattedStamp, PayloadSource, SeriesStore, SimWindow, Summary, TickPayload,
};
use crate::error::FeedError;
use crate::stream::bindings::Bindings;
use crate::stream::registry::{Subscriber, SubscriberRegistry, Subscription};

/// Tuning for [`TelemetryFeed::start_random_stream`].
pub struct RandomStreamOptions {
    /// Number of ticks to publish before the worker self-terminates.
    pub max_ticks: usize,
    /// First simulated day; falls back to the loaded window, then to today.
    pub start_date: Option<NaiveDate>,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RandomStreamOptions {
    fn default() -> Self {
        Self {
            max_ticks: 100,
            start_date: None,
            seed: None,
        }
    }
}

#[derive(Default)]
struct BuiltState {
    window: Option<SimWindow>,
    store: Option<Arc<SeriesStore>>,
    summary: Summary,
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns a workbook snapshot plus the single timer slot that replays it.
pub struct TelemetryFeed {
    source: WorkbookSource,
    state: Arc<Mutex<BuiltState>>,
    registry: SubscriberRegistry,
    worker: Option<Worker>,
}

impl TelemetryFeed {
    pub fn new(source: WorkbookSource) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(BuiltState::default())),
            registry: SubscriberRegistry::new(),
            worker: None,
        }
    }

    /// Load the workbook and rebuild the series snapshot. On failure the
    /// previously built state is left untouched.
    pub fn build(&mut self) -> Result<(), FeedError> {
        let doc = load_workbook(&self.source)?;
        let (window, store, summary) = build_series_store(&doc)?;
        log::info!(
            "built series store: {} day(s) from {} to {}",
            window.days,
            window.start,
            window.end
        );
        let mut state = self.state.lock().unwrap();
        state.window = Some(window);
        state.store = Some(Arc::new(store));
        state.summary = summary;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().unwrap().store.is_some()
    }

    /// The shared series snapshot, if [`build`](Self::build) has succeeded.
    pub fn series_store(&self) -> Option<Arc<SeriesStore>> {
        let store = self.state.lock().unwrap().store.clone();
        if store.is_none() {
            log::warn!("series store requested before a successful build");
        }
        store
    }

    pub fn window(&self) -> Option<SimWindow> {
        self.state.lock().unwrap().window
    }

    pub fn summary(&self) -> Summary {
        self.state.lock().unwrap().summary
    }

    pub fn subscribe(&self, cb: Subscriber) -> Subscription {
        self.registry.subscribe(cb)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    fn slot_busy(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Replay the workbook's per-day series on a fixed interval, cycling
    /// back to day zero after the last day. Builds first if needed.
    pub fn start_workbook_stream(&mut self, interval: Duration) -> Result<(), FeedError> {
        if self.slot_busy() {
            log::warn!("a stream is already running; ignoring start request");
            return Ok(());
        }
        if !self.is_ready() {
            self.build()?;
        }
        let (window, store, summary) = {
            let state = self.state.lock().unwrap();
            // is_ready() held above, and build() fills both fields together.
            match (state.window, state.store.clone()) {
                (Some(w), Some(s)) => (w, s, state.summary),
                _ => return Err(FeedError::MissingWindow("series store not built".into())),
            }
        };

        let registry = self.registry.clone();
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            workbook_loop(interval, window, store, summary, registry, stop_rx);
        });
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Publish synthetic telemetry on a fixed interval. The worker releases
    /// the timer slot by itself after `max_ticks` ticks.
    pub fn start_random_stream(
        &mut self,
        interval: Duration,
        bindings: Bindings,
        options: RandomStreamOptions,
    ) {
        if self.slot_busy() {
            log::warn!("a stream is already running; ignoring start request");
            return;
        }
        let base = self
            .window()
            .map(|w| w.start)
            .or(options.start_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let registry = self.registry.clone();
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            random_loop(interval, base, bindings, options, registry, stop_rx);
        });
        self.worker = Some(Worker { stop_tx, handle });
    }

    /// Stop the running worker (if any) and drop every subscriber. Safe to
    /// call repeatedly or before any stream was started.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
        self.registry.clear();
    }
}

impl Drop for TelemetryFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn workbook_loop(
    interval: Duration,
    window: SimWindow,
    store: Arc<SeriesStore>,
    summary: Summary,
    registry: SubscriberRegistry,
    stop_rx: Receiver<()>,
) {
    let mut rng = StdRng::from_entropy();
    let mut tick = 0usize;
    loop {
        match stop_rx.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let sim_date = sim_datetime(window.start, tick, &mut rng, 0..24);
        let payload = TickPayload {
            tick,
            sim_date,
            formatted: format_stamp(&sim_date),
            series: store.clone(),
            wafer_starts: window.wafer_starts,
            window: Some(window),
            summary,
            source: PayloadSource::Workbook,
        };
        registry.notify(&payload);
        tick += 1;
        if tick >= window.days {
            tick = 0;
        }
    }
}

fn random_loop(
    interval: Duration,
    base: NaiveDate,
    mut bindings: Bindings,
    options: RandomStreamOptions,
    registry: SubscriberRegistry,
    stop_rx: Receiver<()>,
) {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let empty_series = Arc::new(SeriesStore::default());
    let window = SimWindow {
        start: base,
        end: base
            .checked_add_days(Days::new(options.max_ticks.saturating_sub(1) as u64))
            .unwrap_or(base),
        days: options.max_ticks,
        wafer_starts: 0.0,
    };

    for tick in 0..options.max_ticks {
        match stop_rx.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let sim_date = sim_datetime(base, tick, &mut rng, 7..18);
        let formatted = format_stamp(&sim_date);
        let metrics = RandomMetrics::sample(&mut rng);
        bindings.push(&formatted, &metrics);
        let payload = TickPayload {
            tick,
            sim_date,
            formatted,
            series: empty_series.clone(),
            wafer_starts: 0.0,
            window: Some(window),
            summary: Summary::default(),
            source: PayloadSource::Random,
        };
        registry.notify(&payload);
    }
    log::info!("random stream finished after {} tick(s)", options.max_ticks);
}

/// Day `tick` of the window, stamped with a random wall-clock time.
fn sim_datetime(base: NaiveDate, tick: usize, rng: &mut StdRng, hours: Range<u32>) -> NaiveDateTime {
    let day = base + ChronoDuration::days(tick as i64);
    let hour = rng.gen_range(hours);
    let minute = rng.gen_range(0..60);
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    day.and_time(time)
}

/// en-US display strings, e.g. `7/1/2023` and `09:30 AM`.
fn format_stamp(stamp: &NaiveDateTime) -> FormattedStamp {
    FormattedStamp {
        date: stamp.format("%-m/%-d/%Y").to_string(),
        time: stamp.format("%I:%M %p").to_string(),
    }
}
