use std::sync::{Mutex, MutexGuard};

/// Mutual-exclusion capability injected into a logger by its owner.
///
/// One locker is typically shared by every logger writing a logical output
/// stream, so that reads, writes and rotations on that stream serialize.
pub trait Locker: Send + Sync {
    /// Acquire the lock; it is held until the returned guard is dropped
    fn lock(&self) -> LockGuard<'_>;
}

/// Guard returned by [`Locker::lock`]
pub struct LockGuard<'a> {
    _guard: Option<MutexGuard<'a, ()>>,
}

impl LockGuard<'_> {
    /// A guard that holds nothing
    pub fn unlocked() -> Self {
        Self { _guard: None }
    }
}

/// Real lock backed by a mutex
#[derive(Debug, Default)]
pub struct MutexLocker {
    inner: Mutex<()>,
}

impl MutexLocker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Locker for MutexLocker {
    fn lock(&self) -> LockGuard<'_> {
        // The mutex protects no data, so a poisoned lock is still usable
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        LockGuard {
            _guard: Some(guard),
        }
    }
}

/// Lock that never excludes anyone, used for secondary fan-out destinations
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLocker;

impl NullLocker {
    pub fn new() -> Self {
        Self
    }
}

impl Locker for NullLocker {
    fn lock(&self) -> LockGuard<'_> {
        LockGuard::unlocked()
    }
}
