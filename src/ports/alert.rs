//! One-shot user-facing notices.
pub trait Alert: Send + Sync {
    /// Raised the first time a draw finds no usable random.org key.
    fn missing_credential(&self);
}
