#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use truerng::domain::model::{CacheSettings, SourceError};
use truerng::ports::{alert::Alert, clock::Clock, random_source::RandomSource};
use truerng::{AppContext, TrueRng};

pub const FALLBACK: f64 = 0.777;

pub struct FixedClock(pub AtomicI64);

impl FixedClock {
    pub fn at(ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(ms)))
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct CountingAlert(pub AtomicUsize);

impl Alert for CountingAlert {
    fn missing_credential(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted source: pops queued responses, answers with `batch` once the queue is empty.
pub struct FakeSource {
    pub key: String,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<(usize, u8)>>,
    pub responses: Mutex<VecDeque<Result<Vec<f64>, SourceError>>>,
    pub batch: f64,
    pub delay: Option<Duration>,
}

impl FakeSource {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            batch: 0.5,
            delay: None,
        }
    }

    pub fn with_response(self, r: Result<Vec<f64>, SourceError>) -> Self {
        self.responses.lock().unwrap().push_back(r);
        self
    }

    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RandomSource for FakeSource {
    fn api_key(&self) -> &str {
        &self.key
    }

    async fn fetch_decimals(&self, count: usize, decimal_places: u8) -> Result<Vec<f64>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push((count, decimal_places));
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(vec![self.batch; count]))
    }
}

pub struct Harness {
    pub rng: TrueRng,
    pub source: Arc<FakeSource>,
    pub clock: Arc<FixedClock>,
    pub alert: Arc<CountingAlert>,
}

pub fn settings(capacity_target: usize, refill_threshold: f64) -> CacheSettings {
    CacheSettings {
        capacity_target,
        refill_threshold,
        ..CacheSettings::default()
    }
}

pub fn harness(source: FakeSource, settings: CacheSettings) -> Harness {
    let source = Arc::new(source);
    let clock = FixedClock::at(0);
    let alert = Arc::new(CountingAlert::default());
    let dyn_source: Arc<dyn RandomSource> = source.clone();
    let ctx = AppContext::new(clock.clone(), Arc::new(|| FALLBACK), alert.clone())
        .with_settings(settings)
        .with_source(dyn_source);
    Harness {
        rng: TrueRng::new(ctx, Handle::current()),
        source,
        clock,
        alert,
    }
}
