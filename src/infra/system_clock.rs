//! Wall-clock `Clock` for production draws.
use chrono::Utc;

use crate::ports::clock::Clock;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
