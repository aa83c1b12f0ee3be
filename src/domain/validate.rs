//! Strict-mode checks over an index.
//!
//! Construction and insert are permissive; this pass reports what they let through.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::instrument;

use crate::domain::item::TreeItem;
use crate::domain::store::IndexedTree;

/// A structural problem found by [`IndexedTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation<Id> {
    /// The id occurs `count` times in the store.
    DuplicateId { id: Id, count: usize },
    /// The parent id has no item; the subtree is unreachable from any root.
    DanglingParent { id: Id, parent: Id },
    SelfParent { id: Id },
    /// `id` lies on a cycle of parent links; reported once per cycle.
    Cycle { id: Id },
}

impl<Id: fmt::Display> fmt::Display for Violation<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateId { id, count } => write!(f, "duplicate id {} ({} items)", id, count),
            Violation::DanglingParent { id, parent } => {
                write!(f, "{} points to missing parent {}", id, parent)
            }
            Violation::SelfParent { id } => write!(f, "{} is its own parent", id),
            Violation::Cycle { id } => write!(f, "parent chain of {} is cyclic", id),
        }
    }
}

impl<T: TreeItem> IndexedTree<T> {
    /// Report duplicates, dangling parents, self references and cycles.
    ///
    /// Each problem is reported once, in store order of the first item involved.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> Vec<Violation<T::Id>> {
        let mut violations = Vec::new();

        let mut counts: HashMap<&T::Id, usize> = HashMap::new();
        for item in self.get_all() {
            *counts.entry(item.id()).or_default() += 1;
        }
        let mut reported: HashSet<&T::Id> = HashSet::new();
        for item in self.get_all() {
            let count = counts[item.id()];
            if count > 1 && reported.insert(item.id()) {
                violations.push(Violation::DuplicateId {
                    id: item.id().clone(),
                    count,
                });
            }
        }

        for item in self.get_all() {
            match item.parent() {
                Some(parent) if parent == item.id() => violations.push(Violation::SelfParent {
                    id: item.id().clone(),
                }),
                Some(parent) if !self.contains(parent) => {
                    violations.push(Violation::DanglingParent {
                        id: item.id().clone(),
                        parent: parent.clone(),
                    })
                }
                _ => {}
            }
        }

        // Walk each parent chain until it reaches a root, a broken link or an
        // id already settled. An id met twice on one walk lies on a cycle;
        // items that merely lead into a cycle are not reported.
        let mut terminating: HashSet<&T::Id> = HashSet::new();
        let mut doomed: HashSet<&T::Id> = HashSet::new();
        for item in self.get_all() {
            let mut chain: Vec<&T::Id> = Vec::new();
            let mut on_chain: HashSet<&T::Id> = HashSet::new();
            let mut current = Some(item.id());
            let mut ends = true;

            while let Some(id) = current {
                if terminating.contains(id) {
                    break;
                }
                if doomed.contains(id) {
                    ends = false;
                    break;
                }
                if !on_chain.insert(id) {
                    violations.push(Violation::Cycle { id: id.clone() });
                    ends = false;
                    break;
                }
                chain.push(id);
                current = self
                    .get(id)
                    .and_then(|node| node.parent())
                    .filter(|parent| *parent != id && self.contains(parent));
            }

            if ends {
                terminating.extend(chain);
            } else {
                doomed.extend(chain);
            }
        }

        violations
    }
}
