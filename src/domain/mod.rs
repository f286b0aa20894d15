//! Core domain types and logic: configuration models, the cache pool state machine, source errors.
pub mod cache_pool;
pub mod model;
