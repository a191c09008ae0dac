//! Load-once cache for index artifacts.
//!
//! Each cache moves `Unloaded -> Loading -> Loaded`. While one thread is
//! loading, other callers block on the condvar instead of loading again.
//! A failed load drops back to `Unloaded` so a later call can retry.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

enum CacheState<T> {
    Unloaded,
    Loading,
    Loaded(Arc<T>),
}

pub struct LazyCache<T> {
    state: Mutex<CacheState<T>>,
    ready: Condvar,
}

impl<T> Default for LazyCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyCache<T> {
    pub fn new() -> Self {
        Self { state: Mutex::new(CacheState::Unloaded), ready: Condvar::new() }
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), CacheState::Loaded(_))
    }

    /// Return the cached value, running `load` if nothing is cached yet.
    pub fn get_or_load<E, F>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut state = self.state.lock();
        loop {
            if let CacheState::Loaded(value) = &*state {
                return Ok(Arc::clone(value));
            }
            if !matches!(*state, CacheState::Loading) {
                break;
            }
            self.ready.wait(&mut state);
        }
        *state = CacheState::Loading;
        drop(state);

        let loaded = load();

        let mut state = self.state.lock();
        let out = match loaded {
            Ok(value) => {
                let value = Arc::new(value);
                *state = CacheState::Loaded(Arc::clone(&value));
                Ok(value)
            }
            Err(e) => {
                *state = CacheState::Unloaded;
                Err(e)
            }
        };
        self.ready.notify_all();
        out
    }
}
