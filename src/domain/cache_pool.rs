//! Pool of pre-fetched true-random fractions: refill policy, the in-flight refill flag,
//! and time-modulo consumption.
use crate::domain::model::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("buffer underflow: pop on an empty pool")]
    BufferUnderflow,
}

#[derive(Debug, Clone)]
pub struct CachePool {
    buffer: Vec<f64>,
    capacity_target: usize,
    refill_threshold: f64,
    awaiting_refill: bool,
}

impl CachePool {
    pub fn new(capacity_target: usize, refill_threshold: f64) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity_target),
            capacity_target,
            refill_threshold,
            awaiting_refill: false,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.buffer
    }

    pub fn capacity_target(&self) -> usize {
        self.capacity_target
    }

    pub fn refill_threshold(&self) -> f64 {
        self.refill_threshold
    }

    pub fn is_awaiting_refill(&self) -> bool {
        self.awaiting_refill
    }

    pub fn set_capacity_target(&mut self, capacity_target: usize) {
        self.capacity_target = capacity_target;
    }

    pub fn set_refill_threshold(&mut self, refill_threshold: f64) {
        self.refill_threshold = refill_threshold;
    }

    pub fn fill_ratio(&self) -> f64 {
        if self.capacity_target == 0 {
            return 0.0;
        }
        self.buffer.len() as f64 / self.capacity_target as f64
    }

    /// Low-water check: true once the pool holds less than `refill_threshold` of its target.
    pub fn needs_refill(&self) -> bool {
        self.capacity_target == 0 || self.fill_ratio() < self.refill_threshold
    }

    /// Claims the single refill slot. Returns false if a refill is already outstanding.
    pub fn begin_refill(&mut self) -> bool {
        if self.awaiting_refill {
            return false;
        }
        self.awaiting_refill = true;
        true
    }

    /// Releases the refill slot and appends whatever the source delivered, in arrival order.
    /// Returns how many values were appended, or hands the failure back for logging.
    pub fn complete_refill(&mut self, result: Result<Vec<f64>, SourceError>) -> Result<usize, SourceError> {
        self.awaiting_refill = false;
        let values = result?;
        let appended = values.len();
        self.buffer.extend(values);
        Ok(appended)
    }

    pub fn extend<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.buffer.extend(values);
    }

    /// Removes the element at `now_ms mod len`.
    ///
    /// Indexing by wall-clock time rather than arrival order keeps upcoming draws from being
    /// read off the order in which batches arrived. It is a decorrelation heuristic, not a
    /// cryptographic guarantee.
    pub fn pop_at(&mut self, now_ms: i64) -> Result<f64, CacheError> {
        let len = self.buffer.len();
        if len == 0 {
            return Err(CacheError::BufferUnderflow);
        }
        let index = pick_index(now_ms, len);
        Ok(self.buffer.remove(index))
    }
}

/// `now_ms mod len`, kept non-negative for clocks before the epoch.
pub fn pick_index(now_ms: i64, len: usize) -> usize {
    now_ms.rem_euclid(len as i64) as usize
}
