//! Indexed tree: a flat item store with identity, parent and children indexes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::item::{ParentKey, Patch, TreeItem};

/// Hierarchical index over a flat collection of items.
///
/// The primary store keeps insertion order. Three indexes are derived from it
/// and updated in lock-step by `insert`, `update` and `remove`:
/// - identity: id -> slot in the store
/// - parent: id -> normalized parent
/// - children: normalized parent -> child ids in append order
#[derive(Debug, Clone)]
pub struct IndexedTree<T: TreeItem> {
    items: Vec<T>,
    by_id: HashMap<T::Id, usize>,
    parent_by_id: HashMap<T::Id, ParentKey<T::Id>>,
    children_by_parent: HashMap<ParentKey<T::Id>, Vec<T::Id>>,
}

impl<T: TreeItem> Default for IndexedTree<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_id: HashMap::new(),
            parent_by_id: HashMap::new(),
            children_by_parent: HashMap::new(),
        }
    }
}

impl<T: TreeItem> FromIterator<T> for IndexedTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T: TreeItem> IndexedTree<T> {
    /// Build the store and all indexes from `items`.
    ///
    /// Identifiers are not checked for uniqueness: a repeated id overwrites the
    /// identity entry (last one wins) and is listed twice under its parent.
    /// Use [`IndexedTree::validate`] to find such input.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let mut tree = Self {
            items: items.into_iter().collect(),
            ..Self::default()
        };
        for slot in 0..tree.items.len() {
            tree.register(slot);
        }
        debug!("built index over {} items", tree.items.len());
        tree
    }

    /// Add the item at `slot` to all three indexes.
    fn register(&mut self, slot: usize) {
        let item = &self.items[slot];
        let id = item.id().clone();
        let parent = ParentKey::of(item);

        self.by_id.insert(id.clone(), slot);
        self.parent_by_id.insert(id.clone(), parent.clone());
        self.children_by_parent.entry(parent).or_default().push(id);
    }

    fn detach_from(&mut self, parent: &ParentKey<T::Id>, id: &T::Id) {
        if let Some(siblings) = self.children_by_parent.get_mut(parent) {
            if let Some(pos) = siblings.iter().position(|c| c == id) {
                siblings.remove(pos);
            }
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_all(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.by_id.get(id).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn child_ids(&self, parent: &ParentKey<T::Id>) -> &[T::Id] {
        self.children_by_parent
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn resolve<'b>(&self, ids: impl IntoIterator<Item = &'b T::Id>) -> Vec<&T>
    where
        T::Id: 'b,
    {
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    /// Direct children of `id` in append order.
    #[instrument(level = "trace", skip(self))]
    pub fn get_children(&self, id: &T::Id) -> Vec<&T> {
        self.resolve(self.child_ids(&ParentKey::Node(id.clone())))
    }

    /// Items whose parent is the root sentinel.
    #[instrument(level = "trace", skip(self))]
    pub fn roots(&self) -> Vec<&T> {
        self.resolve(self.child_ids(&ParentKey::Root))
    }

    /// Ids below `id`, in stack order: a node's children are pushed in
    /// order and the last pushed is visited first.
    ///
    /// `id` itself is never part of the result, and no id is produced twice
    /// even if the children index contains a cycle.
    fn descendant_ids(&self, id: &T::Id) -> Vec<T::Id> {
        let mut visited: HashSet<&T::Id> = HashSet::from([id]);
        let mut result = Vec::new();
        let mut stack: Vec<&T::Id> = self.child_ids(&ParentKey::Node(id.clone())).iter().collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current.clone());
            stack.extend(self.child_ids(&ParentKey::Node(current.clone())));
        }
        result
    }

    /// Every descendant of `id`, excluding `id`.
    ///
    /// Sibling subtrees come out in no promised order. Ids that no longer
    /// resolve to an item are skipped.
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_children(&self, id: &T::Id) -> Vec<&T> {
        let ids = self.descendant_ids(id);
        self.resolve(ids.iter())
    }

    /// The chain from `id` up to its root, nearest first, `id` included.
    ///
    /// Stops at the root sentinel, at a parent that has no item, or at the
    /// first id seen twice.
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_parents(&self, id: &T::Id) -> Vec<&T> {
        let mut path = Vec::new();
        let mut seen: HashSet<&T::Id> = HashSet::new();
        let mut current = Some(id);

        while let Some(cur) = current {
            let Some(node) = self.get(cur) else {
                break;
            };
            if !seen.insert(node.id()) {
                warn!("cycle in parent chain of {} at {}", id, cur);
                break;
            }
            path.push(node);
            current = self.parent_by_id.get(cur).and_then(ParentKey::as_node);
        }
        path
    }

    /// Items without children, in store order.
    pub fn leaves(&self) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| self.child_ids(&ParentKey::Node(item.id().clone())).is_empty())
            .collect()
    }

    /// Number of levels in the deepest chain reachable from the roots.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut visited: HashSet<&T::Id> = HashSet::new();
        let mut stack: Vec<(&T::Id, usize)> =
            self.child_ids(&ParentKey::Root).iter().map(|id| (id, 1)).collect();

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            max_depth = max_depth.max(depth);
            for child in self.child_ids(&ParentKey::Node(id.clone())) {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Append `item`, failing if its identifier is already present.
    ///
    /// The parent is not required to exist.
    #[instrument(level = "debug", skip(self, item), fields(id = %item.id()))]
    pub fn insert(&mut self, item: T) -> DomainResult<&T> {
        if self.contains(item.id()) {
            debug!("rejecting duplicate {}", item.id());
            return Err(DomainError::DuplicateKey(item.id().to_string()));
        }

        let slot = self.items.len();
        self.items.push(item);
        self.register(slot);
        Ok(&self.items[slot])
    }

    /// Remove `id` and its whole subtree.
    ///
    /// Returns the removed ids, `id` first, then descendants in the order
    /// `get_all_children` walks them. Unknown ids are a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: &T::Id) -> Vec<T::Id> {
        if !self.contains(id) {
            return Vec::new();
        }

        let mut removed = vec![id.clone()];
        removed.extend(self.descendant_ids(id));

        for del in &removed {
            if let Some(parent) = self.parent_by_id.remove(del) {
                self.detach_from(&parent, del);
            }
            self.by_id.remove(del);
            self.children_by_parent.remove(&ParentKey::Node(del.clone()));
        }

        {
            let gone: HashSet<&T::Id> = removed.iter().collect();
            self.items.retain(|item| !gone.contains(item.id()));
        }

        self.by_id.clear();
        for (slot, item) in self.items.iter().enumerate() {
            self.by_id.insert(item.id().clone(), slot);
        }

        debug!("removed {} items", removed.len());
        removed
    }
}

impl<T: TreeItem + Clone> IndexedTree<T> {
    /// Merge `patch` over the existing item.
    ///
    /// The store position never changes. When the parent changes the item is
    /// appended to its new parent's children; otherwise it keeps its place
    /// among its siblings.
    #[instrument(level = "debug", skip(self, patch), fields(id = %patch.id()))]
    pub fn update<P: Patch<T>>(&mut self, patch: P) -> DomainResult<&T> {
        let id = patch.id().clone();
        self.update_with(&id, |item| patch.apply(item))
    }

    /// Closure form of [`IndexedTree::update`]; `f` must not change the id.
    #[instrument(level = "debug", skip(self, f))]
    pub fn update_with<F>(&mut self, id: &T::Id, f: F) -> DomainResult<&T>
    where
        F: FnOnce(&mut T),
    {
        let Some(&slot) = self.by_id.get(id) else {
            return Err(DomainError::NotFound(id.to_string()));
        };

        let mut merged = self.items[slot].clone();
        f(&mut merged);
        if merged.id() != id {
            return Err(DomainError::IdChanged {
                id: id.to_string(),
                new_id: merged.id().to_string(),
            });
        }

        let old_parent = self
            .parent_by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| ParentKey::of(&self.items[slot]));
        let new_parent = ParentKey::of(&merged);
        self.items[slot] = merged;

        if old_parent != new_parent {
            debug!("moving {} from {} to {}", id, old_parent, new_parent);
            self.detach_from(&old_parent, id);
            self.children_by_parent
                .entry(new_parent.clone())
                .or_default()
                .push(id.clone());
            self.parent_by_id.insert(id.clone(), new_parent);
        }

        Ok(&self.items[slot])
    }
}
