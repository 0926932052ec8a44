use std::{
    num::NonZeroUsize,
    sync::{Arc, Condvar, Mutex},
};

/// Fixed-capacity permit pool capping concurrent external invocations.
///
/// A document with many diagrams would otherwise open one child process per
/// diagram simultaneously; every invoker acquires a permit for the duration
/// of one external run.
#[derive(Debug, Clone)]
pub struct PermitPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    available: Mutex<usize>,
    released: Condvar,
}

impl PermitPool {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                available: Mutex::new(capacity.get()),
                released: Condvar::new(),
            }),
        }
    }

    /// Block until a permit is free, then take it. The permit is returned to
    /// the pool when the guard drops.
    pub fn acquire(&self) -> Permit<'_> {
        let mut available = self
            .inner
            .available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while *available == 0 {
            available = self
                .inner
                .released
                .wait(available)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *available -= 1;
        Permit { pool: self }
    }
}

/// RAII guard for one external invocation slot.
#[derive(Debug)]
pub struct Permit<'a> {
    pool: &'a PermitPool,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut available = self
            .pool
            .inner
            .available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *available += 1;
        self.pool.inner.released.notify_one();
    }
}
