//! Live windows indexed by toolkit id, name and handle identity

use std::collections::{BTreeMap, BTreeSet};

use crate::backend::WindowId;
use crate::window::handle::{HandleKey, WindowHandle};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    handle: WindowHandle,
}

/// Registry of the windows the context currently owns
///
/// All three indices change together: an entry is findable by id, by name
/// and by handle, or by none of them. Only the worker thread touches it.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    by_id: BTreeMap<WindowId, Entry>,
    by_name: BTreeMap<String, BTreeSet<WindowId>>,
    by_handle: BTreeMap<HandleKey, WindowId>,
}

impl WindowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live handle under its current id
    ///
    /// Returns `false` and changes nothing if the handle has no id, or if
    /// either the id or the handle is already registered.
    pub fn insert(&mut self, handle: WindowHandle) -> bool {
        let Some(id) = handle.id() else {
            return false;
        };
        if self.by_id.contains_key(&id) || self.by_handle.contains_key(&handle.key()) {
            return false;
        }

        let name = handle.name().to_string();
        self.by_name.entry(name.clone()).or_default().insert(id);
        self.by_handle.insert(handle.key(), id);
        self.by_id.insert(id, Entry { name, handle });
        true
    }

    /// Handle registered under `id`
    pub fn find(&self, id: WindowId) -> Option<&WindowHandle> {
        self.by_id.get(&id).map(|entry| &entry.handle)
    }

    /// All handles registered under `name`, in id order
    pub fn find_by_name(&self, name: &str) -> Vec<&WindowHandle> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.find(*id))
            .collect()
    }

    /// Id under which this exact handle is registered
    pub fn find_by_handle(&self, handle: &WindowHandle) -> Option<WindowId> {
        self.by_handle.get(&handle.key()).copied()
    }

    /// Whether this exact handle is registered
    pub fn contains_handle(&self, handle: &WindowHandle) -> bool {
        self.by_handle.contains_key(&handle.key())
    }

    /// Remove the entry for `id` from every index
    pub fn erase(&mut self, id: WindowId) -> Option<WindowHandle> {
        let entry = self.by_id.remove(&id)?;
        if let Some(ids) = self.by_name.get_mut(&entry.name) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_name.remove(&entry.name);
            }
        }
        self.by_handle.remove(&entry.handle.key());
        Some(entry.handle)
    }

    /// Lowest registered id
    pub fn first_id(&self) -> Option<WindowId> {
        self.by_id.keys().next().copied()
    }

    /// Snapshot of every registered id
    pub fn ids(&self) -> Vec<WindowId> {
        self.by_id.keys().copied().collect()
    }

    /// Number of registered windows
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no window is registered
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::BasicWindow;

    fn live(name: &str, id: i32) -> WindowHandle {
        let handle = WindowHandle::new(name, BasicWindow::new());
        handle.set_id(Some(WindowId(id)));
        handle
    }

    #[test]
    fn test_insert_indexes_all_three_ways() {
        let mut registry = WindowRegistry::new();
        let handle = live("a box", 3);
        assert!(registry.insert(handle.clone()));

        assert!(registry.find(WindowId(3)).is_some_and(|found| found.ptr_eq(&handle)));
        assert_eq!(registry.find_by_name("a box").len(), 1);
        assert_eq!(registry.find_by_handle(&handle), Some(WindowId(3)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicates_and_unassigned() {
        let mut registry = WindowRegistry::new();
        let handle = live("a", 1);
        assert!(registry.insert(handle.clone()));
        assert!(!registry.insert(handle.clone()));
        assert!(!registry.insert(live("b", 1)));
        assert!(!registry.insert(WindowHandle::new("c", BasicWindow::new())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_may_repeat() {
        let mut registry = WindowRegistry::new();
        registry.insert(live("box", 5));
        registry.insert(live("box", 2));
        registry.insert(live("other", 9));

        let ids: Vec<_> = registry.find_by_name("box").iter().filter_map(|h| h.id()).collect();
        assert_eq!(ids, vec![WindowId(2), WindowId(5)]);
        assert!(registry.find_by_name("missing").is_empty());
    }

    #[test]
    fn test_erase_removes_every_index() {
        let mut registry = WindowRegistry::new();
        let handle = live("box", 4);
        registry.insert(handle.clone());
        registry.insert(live("box", 6));

        assert!(registry.erase(WindowId(4)).is_some());
        assert!(registry.find(WindowId(4)).is_none());
        assert!(!registry.contains_handle(&handle));
        assert_eq!(registry.find_by_name("box").len(), 1);
        assert!(registry.erase(WindowId(4)).is_none());

        registry.erase(WindowId(6));
        assert!(registry.is_empty());
        assert!(registry.by_name.is_empty());
    }

    #[test]
    fn test_first_id_and_snapshot() {
        let mut registry = WindowRegistry::new();
        assert_eq!(registry.first_id(), None);
        registry.insert(live("a", 8));
        registry.insert(live("b", 3));
        assert_eq!(registry.first_id(), Some(WindowId(3)));
        assert_eq!(registry.ids(), vec![WindowId(3), WindowId(8)]);
    }
}
