use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::app::true_rng::{Inner, RefillSettings};
use crate::domain::model::SourceError;
use crate::ports::random_source::RandomSource;

/// Background half of a refill: fetch, append (or log the failure), release the in-flight slot,
/// wake `refill_settled` waiters. Nothing here reaches a draw caller.
pub(crate) async fn run(
    inner: Arc<Inner>,
    source: Arc<dyn RandomSource>,
    count: usize,
    settings: RefillSettings,
) {
    let started = Instant::now();
    debug!(count, decimal_places = settings.decimal_places, "refill request start");

    let fetch = source.fetch_decimals(count, settings.decimal_places);
    let result = match settings.timeout {
        Some(limit) => match tokio::time::timeout(limit, fetch).await {
            Ok(r) => r,
            Err(_) => Err(SourceError::Timeout),
        },
        None => fetch.await,
    };

    let outcome = {
        let mut pool = inner.lock_pool();
        pool.complete_refill(result).map(|appended| (appended, pool.len()))
    };

    match outcome {
        Ok((appended, len)) => {
            inner.metrics.record_refill_finished(true);
            debug!(
                appended,
                pool_len = len,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "got new random numbers"
            );
        }
        Err(e) => {
            inner.metrics.record_refill_finished(false);
            warn!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "refill failed, keeping current pool"
            );
        }
    }

    inner.settled.notify_waiters();
}
