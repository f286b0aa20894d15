//! `Alert` implementation that surfaces notices through the log.
use tracing::warn;

use crate::ports::alert::Alert;

#[derive(Default)]
pub struct LogAlert;

impl Alert for LogAlert {
    fn missing_credential(&self) {
        warn!(
            "WARNING MISSING API KEY: set random_org.api_key (or TRUERNG_API_KEY) for true-random draws; \
             using the fallback generator until then"
        );
    }
}
