use std::sync::Arc;

use crate::domain::model::CacheSettings;
use crate::ports::{alert::Alert, clock::Clock, random_source::RandomSource, uniform::UniformRng};

/// Bundles what the facade needs (settings, remote source, clock, fallback generator, alert
/// surface). Built once at the composition root.
pub struct AppContext {
    pub settings: CacheSettings,
    pub source: Option<Arc<dyn RandomSource>>,
    pub clock: Arc<dyn Clock>,
    pub fallback: Arc<dyn UniformRng>,
    pub alert: Arc<dyn Alert>,
}

impl AppContext {
    pub fn new(clock: Arc<dyn Clock>, fallback: Arc<dyn UniformRng>, alert: Arc<dyn Alert>) -> Self {
        Self {
            settings: CacheSettings::default(),
            source: None,
            clock,
            fallback,
            alert,
        }
    }

    pub fn with_settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_source(mut self, source: Arc<dyn RandomSource>) -> Self {
        self.source = Some(source);
        self
    }
}
