//! Draw interception: a single-slot holder for "which function produces this draw" plus the
//! pre-draw and post-draw hook signatures.
use std::fmt;
use std::sync::Arc;

use crate::app::true_rng::TrueRng;

pub type CustomDraw = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Pre-draw hook. Receives the facade and the draw slot; returning true forces the fallback
/// generator regardless of what the hook left in the slot.
pub type PreDrawHook = Arc<dyn Fn(&TrueRng, &mut DrawFn) -> bool + Send + Sync>;

/// Post-draw hook. Whatever it leaves in the value is returned as-is, range unchecked.
pub type PostDrawHook = Arc<dyn Fn(&TrueRng, &mut f64) + Send + Sync>;

#[derive(Clone, Default)]
pub enum DrawFn {
    /// Pop from the true-random pool.
    #[default]
    Pool,
    Fallback,
    Custom(CustomDraw),
}

impl DrawFn {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        DrawFn::Custom(Arc::new(f))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawFn::Pool => "pool",
            DrawFn::Fallback => "fallback",
            DrawFn::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for DrawFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// At most one hook of each kind; registering again replaces the previous one.
#[derive(Clone, Default)]
pub(crate) struct EventHooks {
    pub(crate) pre_draw: Option<PreDrawHook>,
    pub(crate) post_draw: Option<PostDrawHook>,
}
