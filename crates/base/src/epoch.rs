use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A shared generation counter used to invalidate late results.
///
/// Work is stamped with the generation it was issued under. Once `advance()`
/// is called, anything carrying an older stamp is stale and must be ignored
/// by whoever receives it.
#[derive(Clone, Debug)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl Epoch {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Move to the next generation and return it.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }

    /// Stamp `inner` with the current generation.
    pub fn stamp<T>(&self, inner: T) -> Stamped<T> {
        Stamped {
            epoch: self.current(),
            inner,
        }
    }
}

/// A value stamped with the generation it was created in.
#[derive(Clone, Debug)]
pub struct Stamped<T> {
    pub epoch: u64,
    pub inner: T,
}

impl<T> Stamped<T> {
    pub fn is_current(&self, epoch: &Epoch) -> bool {
        epoch.is_current(self.epoch)
    }

    /// The inner value if it is still current, `None` if it went stale.
    pub fn take_if_current(self, epoch: &Epoch) -> Option<T> {
        if self.is_current(epoch) {
            Some(self.inner)
        } else {
            None
        }
    }
}
