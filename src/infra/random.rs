use std::sync::{Mutex, PoisonError};

use rand::Rng;

use crate::ports::uniform::UniformRng;

/// Local pseudo-random generator used as the fallback for draws the pool cannot serve.
pub struct MutexRng {
    inner: Mutex<rand::rngs::StdRng>,
}

impl MutexRng {
    pub fn new() -> Self {
        let seed = rand::thread_rng().gen::<[u8; 32]>();
        Self { inner: Mutex::new(rand::SeedableRng::from_seed(seed)) }
    }
}

impl Default for MutexRng {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRng for MutexRng {
    fn next_f64(&self) -> f64 {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.gen::<f64>()
    }
}
