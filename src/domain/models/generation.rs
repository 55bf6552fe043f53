use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub type Generation = u64;

/// Identifies the file selection that is currently live. Every new selection
/// (or clear) advances it, and results tagged with an older value are stale.
#[derive(Clone, Debug, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn advance(&self) -> Generation {
        return self.current.fetch_add(1, Ordering::SeqCst) + 1;
    }

    pub fn current(&self) -> Generation {
        return self.current.load(Ordering::SeqCst);
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        return self.current() == generation;
    }
}
