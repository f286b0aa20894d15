//! Infrastructure adapters: config loading, logging setup, random.org client, clock, fallback rng, metrics.
pub mod alert;
pub mod config;
pub mod json_rpc;
pub mod logging;
pub mod metrics;
pub mod random;
pub mod random_org;
pub mod system_clock;
pub mod time;
