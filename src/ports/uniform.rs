//! Synchronous uniform generator (0-1 floats). Serves every draw the pool cannot.
pub trait UniformRng: Send + Sync {
    fn next_f64(&self) -> f64; // expected in [0,1)
}

impl<F> UniformRng for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn next_f64(&self) -> f64 {
        self()
    }
}
