//! True-random draws for a host that expects a plain `() -> f64` generator.
//!
//! A pool of fractions fetched from random.org is kept topped up in the background; every draw
//! is served synchronously from that pool, or from the local fallback generator whenever the
//! pool is empty, disabled, or has no api key to refill with.
pub mod app;
pub mod domain;
pub mod infra;
pub mod ports;

pub use app::context::AppContext;
pub use app::hooks::DrawFn;
pub use app::true_rng::TrueRng;
pub use domain::model::SourceError;
