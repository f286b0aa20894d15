//! Lock-free counters describing where draws came from and how refills went.
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrigin {
    Pool,
    Fallback,
    Custom,
}

#[derive(Debug, Default)]
pub struct DrawMetrics {
    pool_draws: AtomicU64,
    fallback_draws: AtomicU64,
    custom_draws: AtomicU64,
    refills_issued: AtomicU64,
    refills_ok: AtomicU64,
    refills_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pool_draws: u64,
    pub fallback_draws: u64,
    pub custom_draws: u64,
    pub refills_issued: u64,
    pub refills_ok: u64,
    pub refills_failed: u64,
}

impl DrawMetrics {
    pub fn record_draw(&self, origin: DrawOrigin) {
        let counter = match origin {
            DrawOrigin::Pool => &self.pool_draws,
            DrawOrigin::Fallback => &self.fallback_draws,
            DrawOrigin::Custom => &self.custom_draws,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refill_issued(&self) {
        self.refills_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refill_finished(&self, ok: bool) {
        if ok {
            self.refills_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.refills_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pool_draws: self.pool_draws.load(Ordering::Relaxed),
            fallback_draws: self.fallback_draws.load(Ordering::Relaxed),
            custom_draws: self.custom_draws.load(Ordering::Relaxed),
            refills_issued: self.refills_issued.load(Ordering::Relaxed),
            refills_ok: self.refills_ok.load(Ordering::Relaxed),
            refills_failed: self.refills_failed.load(Ordering::Relaxed),
        }
    }
}
