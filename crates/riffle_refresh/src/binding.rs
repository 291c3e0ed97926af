//! Per-surface controller registry
//!
//! A surface gets at most one [`RefreshController`] and one
//! [`LoadMoreController`], created lazily on first request and returned
//! unchanged afterward. Entries are keyed by surface identity and hold the
//! surface weakly; entries whose surface is gone stay until
//! [`SurfaceBinding::prune`] drops them.

use std::sync::{Arc, Mutex, Weak};

use riffle_core::sync::lock;
use riffle_core::{Result, RiffleError, ScrollSurface};
use rustc_hash::FxHashMap;

use crate::load_more::LoadMoreController;
use crate::refresh::RefreshController;

struct Entry {
    surface: Weak<dyn ScrollSurface>,
    refresh: Option<Arc<RefreshController>>,
    load_more: Option<Arc<LoadMoreController>>,
}

impl Entry {
    fn new(surface: &Arc<dyn ScrollSurface>) -> Self {
        Self {
            surface: Arc::downgrade(surface),
            refresh: None,
            load_more: None,
        }
    }

    fn is_live(&self) -> bool {
        self.surface.strong_count() > 0
    }

    fn detach(&self) {
        if let Some(refresh) = &self.refresh {
            refresh.detach();
        }
        if let Some(load_more) = &self.load_more {
            load_more.detach();
        }
    }
}

/// Registry that binds controllers to surfaces
#[derive(Default)]
pub struct SurfaceBinding {
    entries: Mutex<FxHashMap<usize, Entry>>,
}

/// Identity of a surface allocation
fn surface_key(surface: &Arc<dyn ScrollSurface>) -> usize {
    Arc::as_ptr(surface) as *const () as usize
}

impl SurfaceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// The surface's refresh controller, created on first request
    pub fn get_or_create_refresh_controller(
        &self,
        surface: &Arc<dyn ScrollSurface>,
    ) -> Arc<RefreshController> {
        let mut entries = lock(&self.entries);
        let entry = Self::entry(&mut entries, surface);
        Arc::clone(
            entry
                .refresh
                .get_or_insert_with(|| RefreshController::attach(surface)),
        )
    }

    /// The surface's load-more controller, created on first request
    pub fn get_or_create_load_more_controller(
        &self,
        surface: &Arc<dyn ScrollSurface>,
    ) -> Arc<LoadMoreController> {
        let mut entries = lock(&self.entries);
        let entry = Self::entry(&mut entries, surface);
        Arc::clone(
            entry
                .load_more
                .get_or_insert_with(|| LoadMoreController::attach(surface)),
        )
    }

    /// Like [`get_or_create_refresh_controller`](Self::get_or_create_refresh_controller)
    /// for a surface that may already be gone
    pub fn try_refresh_controller(
        &self,
        surface: &Weak<dyn ScrollSurface>,
    ) -> Result<Arc<RefreshController>> {
        let surface = surface.upgrade().ok_or(RiffleError::SurfaceGone)?;
        Ok(self.get_or_create_refresh_controller(&surface))
    }

    /// Like [`get_or_create_load_more_controller`](Self::get_or_create_load_more_controller)
    /// for a surface that may already be gone
    pub fn try_load_more_controller(
        &self,
        surface: &Weak<dyn ScrollSurface>,
    ) -> Result<Arc<LoadMoreController>> {
        let surface = surface.upgrade().ok_or(RiffleError::SurfaceGone)?;
        Ok(self.get_or_create_load_more_controller(&surface))
    }

    /// Detach and forget the surface's controllers
    ///
    /// Returns false if the surface had none.
    pub fn release(&self, surface: &Arc<dyn ScrollSurface>) -> bool {
        let removed = lock(&self.entries).remove(&surface_key(surface));
        match removed {
            Some(entry) => {
                entry.detach();
                tracing::debug!("Released surface controllers");
                true
            }
            None => false,
        }
    }

    /// Drop entries whose surface is gone; returns how many were dropped
    pub fn prune(&self) -> usize {
        let stale: Vec<Entry> = {
            let mut entries = lock(&self.entries);
            let keys: Vec<usize> = entries
                .iter()
                .filter(|(_, entry)| !entry.is_live())
                .map(|(key, _)| *key)
                .collect();
            keys.iter().filter_map(|key| entries.remove(key)).collect()
        };

        for entry in &stale {
            entry.detach();
        }
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "Pruned stale surface bindings");
        }
        stale.len()
    }

    /// Number of bound surfaces, including ones not yet pruned
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry<'a>(
        entries: &'a mut FxHashMap<usize, Entry>,
        surface: &Arc<dyn ScrollSurface>,
    ) -> &'a mut Entry {
        // The entry's weak reference keeps the allocation, so the key
        // cannot be reused by another surface while the entry exists.
        entries
            .entry(surface_key(surface))
            .or_insert_with(|| Entry::new(surface))
    }
}
