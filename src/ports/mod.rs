//! Seams the facade talks through: remote source, fallback generator, clock, alert surface.
pub mod alert;
pub mod clock;
pub mod random_source;
pub mod uniform;
