//! Application layer: the draw facade, its hooks, and the background refill task.
pub mod context;
pub mod hooks;
mod refill;
pub mod true_rng;
