//! Workspace view generations.
//!
//! Every workspace page carries a view id in its links. Loading the page
//! registers a generation for that view; a load that finishes after a newer
//! load of the same view started is no longer current and its result is
//! dropped instead of rendered. Other views, other tabs and posted actions
//! are never affected.
//!
//! Only views with a load in flight are tracked: the newest lifetime of a
//! view removes its entry when dropped.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct Generations {
    last: u64,
    current: HashMap<String, u64>,
}

#[derive(Debug, Default, Clone)]
pub struct ViewRegistry {
    inner: Arc<Mutex<Generations>>,
}

impl ViewRegistry {
    fn lock(&self) -> MutexGuard<'_, Generations> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A fresh view id for a page opened without one.
    pub fn issue(&self) -> u64 {
        let mut generations = self.lock();
        generations.last += 1;
        generations.last
    }

    /// Registers a load of `view_key`, superseding any load of it still in flight.
    pub fn begin(&self, view_key: &str) -> ViewLifetime {
        let mut generations = self.lock();
        generations.last += 1;
        let generation = generations.last;
        generations.current.insert(view_key.to_string(), generation);
        ViewLifetime {
            registry: Some(self.clone()),
            view_key: view_key.to_string(),
            generation,
        }
    }

    fn is_current(&self, view_key: &str, generation: u64) -> bool {
        self.lock().current.get(view_key) == Some(&generation)
    }

    fn release(&self, view_key: &str, generation: u64) {
        let mut generations = self.lock();
        if generations.current.get(view_key) == Some(&generation) {
            generations.current.remove(view_key);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().current.len()
    }
}

#[derive(Debug)]
pub struct ViewLifetime {
    registry: Option<ViewRegistry>,
    view_key: String,
    generation: u64,
}

impl ViewLifetime {
    pub fn is_current(&self) -> bool {
        match &self.registry {
            Some(registry) => registry.is_current(&self.view_key, self.generation),
            None => true,
        }
    }

    /// Always current. Posted actions load with this so a newer page load
    /// never cancels a mutation.
    pub fn detached() -> Self {
        ViewLifetime {
            registry: None,
            view_key: String::new(),
            generation: 0,
        }
    }
}

impl Drop for ViewLifetime {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            registry.release(&self.view_key, self.generation);
        }
    }
}
