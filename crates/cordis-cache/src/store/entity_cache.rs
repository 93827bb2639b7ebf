//! Generic per-kind entity store
//!
//! One `EntityCache` exists per entity kind. Entries are keyed by id and keep
//! their first-insertion order, so `all()` is stable across overwrites.

use std::collections::HashMap;
use std::fmt;

use cordis_core::{Entity, Patchable, Snowflake};
use parking_lot::RwLock;

struct Inner<T> {
    items: HashMap<Snowflake, T>,
    order: Vec<Snowflake>,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
        }
    }
}

/// Id-keyed store for one entity kind
///
/// Reads hand out clones; nothing outside the store ever holds a reference
/// into it.
pub struct EntityCache<T> {
    inner: RwLock<Inner<T>>,
}

impl<T: Entity> EntityCache<T> {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Look up by id; a miss means "not known yet"
    pub fn get(&self, id: Snowflake) -> Option<T> {
        self.inner.read().items.get(&id).cloned()
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.inner.read().items.contains_key(&id)
    }

    /// Insert or overwrite; returns the previous entry for this id
    ///
    /// Idempotent: re-inserting an id replaces it in place and keeps its
    /// original position in `all()`.
    pub fn insert(&self, entity: T) -> Option<T> {
        let id = entity.id();
        let mut inner = self.inner.write();
        let previous = inner.items.insert(id, entity);
        if previous.is_none() {
            inner.order.push(id);
        }
        previous
    }

    /// Remove by id; no-op if absent
    pub fn remove(&self, id: Snowflake) -> Option<T> {
        let mut inner = self.inner.write();
        let removed = inner.items.remove(&id);
        if removed.is_some() {
            inner.order.retain(|existing| *existing != id);
        }
        removed
    }

    /// Mutate an entry in place; returns false when the id is unknown
    pub fn update<F>(&self, id: Snowflake, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.inner.write().items.get_mut(&id) {
            Some(entity) => {
                f(entity);
                true
            }
            None => false,
        }
    }

    /// Snapshot of every entry, in insertion order
    ///
    /// Each call is a fresh traversal; no cursor state is shared.
    pub fn all(&self) -> Vec<T> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id).cloned())
            .collect()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> Vec<Snowflake> {
        self.inner.read().order.clone()
    }

    /// Entries matching a predicate, in insertion order
    pub fn filter<P>(&self, mut predicate: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }

    /// Drop every entry the predicate rejects; returns what was dropped
    pub fn retain<P>(&self, mut keep: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let mut inner = self.inner.write();
        let Inner { items, order } = &mut *inner;

        let mut removed = Vec::new();
        order.retain(|id| {
            let Some(entity) = items.get(id) else {
                return false;
            };
            if keep(entity) {
                return true;
            }
            if let Some(entity) = items.remove(id) {
                removed.push(entity);
            }
            false
        });
        removed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.items.clear();
        inner.order.clear();
    }
}

impl<T: Patchable> EntityCache<T> {
    /// Merge a partial payload into an existing entry
    ///
    /// Returns `(before, after)`, or `None` when the id is not cached.
    pub fn patch(&self, id: Snowflake, patch: &T::Patch) -> Option<(T, T)> {
        let mut inner = self.inner.write();
        let entity = inner.items.get_mut(&id)?;
        let before = entity.clone();
        entity.apply(patch);
        Some((before, entity.clone()))
    }
}

impl<T: Entity> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EntityCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("len", &self.inner.read().items.len())
            .finish()
    }
}
