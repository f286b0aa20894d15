//! Drop-in replacement for a `() -> f64` generator: serves draws from the true-random pool,
//! schedules refills in the background, and falls back to the local generator whenever the
//! pool cannot serve.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error};

use crate::app::context::AppContext;
use crate::app::hooks::{DrawFn, EventHooks, PostDrawHook, PreDrawHook};
use crate::app::refill;
use crate::domain::cache_pool::{CacheError, CachePool};
use crate::domain::model::{CacheSettings, DEFAULT_REFILL_THRESHOLD};
use crate::infra::config::{MAX_UPDATE_POINT, MIN_UPDATE_POINT};
use crate::infra::metrics::{DrawMetrics, DrawOrigin, MetricsSnapshot};
use crate::infra::random_org::MAX_DECIMAL_PLACES;
use crate::infra::time::format_epoch_ms;
use crate::ports::{alert::Alert, clock::Clock, random_source::RandomSource, uniform::UniformRng};

#[derive(Debug, Clone, Copy)]
pub(crate) struct RefillSettings {
    pub(crate) decimal_places: u8,
    pub(crate) timeout: Option<Duration>,
}

pub(crate) struct Inner {
    pub(crate) pool: Mutex<CachePool>,
    pub(crate) metrics: DrawMetrics,
    pub(crate) settled: Notify,
    enabled: AtomicBool,
    warned_missing_key: AtomicBool,
    last_drawn: AtomicU64,
    refill_settings: Mutex<RefillSettings>,
    source: RwLock<Option<Arc<dyn RandomSource>>>,
    hooks: RwLock<EventHooks>,
    clock: Arc<dyn Clock>,
    fallback: Arc<dyn UniformRng>,
    alert: Arc<dyn Alert>,
    runtime: Handle,
}

impl Inner {
    pub(crate) fn lock_pool(&self) -> MutexGuard<'_, CachePool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap to clone; every clone shares the same pool, hooks and settings.
#[derive(Clone)]
pub struct TrueRng {
    inner: Arc<Inner>,
}

impl TrueRng {
    /// Refills are spawned on `runtime`; draws themselves never block on it.
    pub fn new(ctx: AppContext, runtime: Handle) -> Self {
        let settings = ctx.settings;
        let initial = ctx.fallback.next_f64();
        Self {
            inner: Arc::new(Inner {
                pool: Mutex::new(CachePool::new(
                    settings.capacity_target.max(1),
                    clamp_threshold(settings.refill_threshold, DEFAULT_REFILL_THRESHOLD),
                )),
                metrics: DrawMetrics::default(),
                settled: Notify::new(),
                enabled: AtomicBool::new(settings.enabled),
                warned_missing_key: AtomicBool::new(false),
                last_drawn: AtomicU64::new(initial.to_bits()),
                refill_settings: Mutex::new(RefillSettings {
                    decimal_places: settings.decimal_places.clamp(1, MAX_DECIMAL_PLACES),
                    timeout: settings.refill_timeout,
                }),
                source: RwLock::new(ctx.source),
                hooks: RwLock::new(EventHooks::default()),
                clock: ctx.clock,
                fallback: ctx.fallback,
                alert: ctx.alert,
                runtime,
            }),
        }
    }

    /// Returns one float, always. See `draw`.
    pub fn get_random_number(&self) -> f64 {
        self.draw()
    }

    /// Ordered decision chain: disabled, unconfigured, empty, low-water, draw, post-process.
    pub fn draw(&self) -> f64 {
        if !self.is_enabled() {
            debug!("truerng disabled, using fallback");
            return self.fallback_draw();
        }

        if !self.is_configured() {
            if !self.inner.warned_missing_key.swap(true, Ordering::SeqCst) {
                self.inner.alert.missing_credential();
            }
            debug!("bad api key, using fallback");
            return self.fallback_draw();
        }

        let (len, needs_refill, capacity) = {
            let pool = self.inner.lock_pool();
            (pool.len(), pool.needs_refill(), pool.capacity_target())
        };

        if len == 0 {
            debug!("no random numbers cached, using fallback");
            self.request_refill();
            return self.fallback_draw();
        }

        if needs_refill {
            debug!(len, capacity, "limited random numbers available");
            self.request_refill();
        }

        let mut draw_fn = DrawFn::Pool;
        if let Some(hook) = self.pre_draw_hook() {
            if hook(self, &mut draw_fn) {
                draw_fn = DrawFn::Fallback;
            }
        }

        let mut value = self.invoke(&draw_fn);

        if let Some(hook) = self.post_draw_hook() {
            hook(self, &mut value);
        }

        self.inner.last_drawn.store(value.to_bits(), Ordering::SeqCst);
        value
    }

    /// Removes one value from the pool at the time-modulo index.
    pub fn pop(&self) -> Result<f64, CacheError> {
        let now_ms = self.inner.clock.now_epoch_ms();
        let mut pool = self.inner.lock_pool();
        let len = pool.len();
        let value = pool.pop_at(now_ms)?;
        debug!(value, len, at = %format_epoch_ms(now_ms), "popped cached number");
        Ok(value)
    }

    /// Fire-and-forget refill. Returns true when a request was actually issued; false when
    /// disabled, unconfigured, or a refill is already in flight.
    pub fn request_refill(&self) -> bool {
        if !self.is_enabled() {
            debug!("truerng disabled, skipping refill");
            return false;
        }
        let Some(source) = self.configured_source() else {
            debug!("no usable api key, skipping refill");
            return false;
        };

        let count = {
            let mut pool = self.inner.lock_pool();
            if !pool.begin_refill() {
                debug!("already awaiting a response");
                return false;
            }
            pool.capacity_target()
        };

        let settings = *self
            .inner
            .refill_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.metrics.record_refill_issued();
        self.inner
            .runtime
            .spawn(refill::run(Arc::clone(&self.inner), source, count, settings));
        true
    }

    /// Resolves once no refill is in flight.
    pub async fn refill_settled(&self) {
        loop {
            let notified = self.inner.settled.notified();
            let awaiting = self.inner.lock_pool().is_awaiting_refill();
            if !awaiting {
                return;
            }
            notified.await;
        }
    }

    /// Appends values to the pool as if a refill had delivered them.
    pub fn preload<I>(&self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.inner.lock_pool().extend(values);
    }

    /// Swaps the remote source (e.g. after the api key changed) and pulls in a fresh batch.
    pub fn update_source(&self, source: Arc<dyn RandomSource>) -> bool {
        debug!(configured = !source.api_key().is_empty(), "updating random source");
        *self
            .inner
            .source
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(source);
        self.request_refill()
    }

    pub fn is_configured(&self) -> bool {
        self.configured_source().is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        debug!(enabled, "new enabled setting");
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flips the enabled flag and returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.inner.enabled.fetch_xor(true, Ordering::SeqCst);
        debug!(enabled, "toggled");
        enabled
    }

    pub fn set_capacity_target(&self, capacity_target: usize) {
        debug!(capacity_target, "new max cached numbers");
        self.inner.lock_pool().set_capacity_target(capacity_target.max(1));
    }

    /// Clamped to the configurable range; non-finite values leave the threshold unchanged.
    pub fn set_refill_threshold(&self, refill_threshold: f64) {
        let mut pool = self.inner.lock_pool();
        let refill_threshold = clamp_threshold(refill_threshold, pool.refill_threshold());
        debug!(refill_threshold, "new update point");
        pool.set_refill_threshold(refill_threshold);
    }

    pub fn set_decimal_places(&self, decimal_places: u8) {
        debug!(decimal_places, "new decimal places");
        self.inner
            .refill_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .decimal_places = decimal_places.clamp(1, MAX_DECIMAL_PLACES);
    }

    pub fn set_refill_timeout(&self, timeout: Option<Duration>) {
        self.inner
            .refill_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timeout = timeout;
    }

    pub fn settings(&self) -> CacheSettings {
        let pool = self.inner.lock_pool();
        let refill = *self
            .inner
            .refill_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        CacheSettings {
            enabled: self.is_enabled(),
            capacity_target: pool.capacity_target(),
            refill_threshold: pool.refill_threshold(),
            decimal_places: refill.decimal_places,
            refill_timeout: refill.timeout,
        }
    }

    pub fn on_pre_draw<F>(&self, hook: F)
    where
        F: Fn(&TrueRng, &mut DrawFn) -> bool + Send + Sync + 'static,
    {
        self.write_hooks().pre_draw = Some(Arc::new(hook));
    }

    pub fn on_post_draw<F>(&self, hook: F)
    where
        F: Fn(&TrueRng, &mut f64) + Send + Sync + 'static,
    {
        self.write_hooks().post_draw = Some(Arc::new(hook));
    }

    pub fn clear_pre_draw(&self) {
        self.write_hooks().pre_draw = None;
    }

    pub fn clear_post_draw(&self) {
        self.write_hooks().post_draw = None;
    }

    pub fn pool_len(&self) -> usize {
        self.inner.lock_pool().len()
    }

    pub fn pool_values(&self) -> Vec<f64> {
        self.inner.lock_pool().values().to_vec()
    }

    pub fn is_awaiting_refill(&self) -> bool {
        self.inner.lock_pool().is_awaiting_refill()
    }

    pub fn has_warned_missing_key(&self) -> bool {
        self.inner.warned_missing_key.load(Ordering::SeqCst)
    }

    /// Most recent value `draw` returned after the full chain ran. Observability only.
    pub fn last_drawn_value(&self) -> f64 {
        f64::from_bits(self.inner.last_drawn.load(Ordering::SeqCst))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    fn configured_source(&self) -> Option<Arc<dyn RandomSource>> {
        self.inner
            .source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|s| !s.api_key().is_empty())
            .cloned()
    }

    fn pre_draw_hook(&self) -> Option<PreDrawHook> {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pre_draw
            .clone()
    }

    fn post_draw_hook(&self) -> Option<PostDrawHook> {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .post_draw
            .clone()
    }

    fn write_hooks(&self) -> std::sync::RwLockWriteGuard<'_, EventHooks> {
        self.inner.hooks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fallback_draw(&self) -> f64 {
        self.inner.metrics.record_draw(DrawOrigin::Fallback);
        self.inner.fallback.next_f64()
    }

    fn invoke(&self, draw_fn: &DrawFn) -> f64 {
        match draw_fn {
            DrawFn::Pool => match self.pop() {
                Ok(value) => {
                    self.inner.metrics.record_draw(DrawOrigin::Pool);
                    value
                }
                Err(e) => {
                    // Only reachable if the pool was drained between the empty check and here.
                    error!(error = %e, "pool drained mid-draw, using fallback");
                    self.fallback_draw()
                }
            },
            DrawFn::Fallback => self.fallback_draw(),
            DrawFn::Custom(f) => {
                self.inner.metrics.record_draw(DrawOrigin::Custom);
                f()
            }
        }
    }
}

fn clamp_threshold(value: f64, current: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_UPDATE_POINT, MAX_UPDATE_POINT)
    } else {
        current
    }
}

impl UniformRng for TrueRng {
    fn next_f64(&self) -> f64 {
        self.draw()
    }
}
