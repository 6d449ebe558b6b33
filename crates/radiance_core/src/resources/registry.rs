//! String-keyed resource registry.
//!
//! Passes look up textures, samplers and shader modules by name. A miss or a
//! colliding insert is an error for the calling operation, never a silent
//! `None`.

use rustc_hash::FxHashMap;

use crate::errors::{RadianceError, ResourceKind, Result};

/// Name → resource map that fails fast on duplicates and misses.
#[derive(Debug)]
pub struct ResourceRegistry<T> {
    kind: ResourceKind,
    entries: FxHashMap<String, T>,
}

impl<T> ResourceRegistry<T> {
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: FxHashMap::default(),
        }
    }

    /// Adds `value` under `key`. Fails if the key is taken.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(RadianceError::DuplicateResource {
                kind: self.kind,
                key,
            });
        }
        log::debug!("Registered {} '{}'", self.kind, key);
        self.entries.insert(key, value);
        Ok(())
    }

    /// Stores `value` under `key`, returning the previous entry if any.
    pub fn replace(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        let key = key.into();
        let old = self.entries.insert(key.clone(), value);
        if old.is_some() {
            log::debug!("Replaced {} '{}'", self.kind, key);
        }
        old
    }

    pub fn get(&self, key: &str) -> Result<&T> {
        self.entries
            .get(key)
            .ok_or_else(|| RadianceError::MissingResource {
                kind: self.kind,
                key: key.to_owned(),
            })
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut T> {
        let kind = self.kind;
        self.entries
            .get_mut(key)
            .ok_or_else(|| RadianceError::MissingResource {
                kind,
                key: key.to_owned(),
            })
    }

    pub fn remove(&mut self, key: &str) -> Result<T> {
        self.entries
            .remove(key)
            .ok_or_else(|| RadianceError::MissingResource {
                kind: self.kind,
                key: key.to_owned(),
            })
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> ResourceRegistry<T> {
    /// Returns a clone of the entry (a new shared handle for `GpuTexture`).
    pub fn get_cloned(&self, key: &str) -> Result<T> {
        self.get(key).cloned()
    }
}
