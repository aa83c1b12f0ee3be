/*
Rendering of the root-reachable part of an index as a termtree.
Items whose parent chain is broken or cyclic never show up here.
 */
use std::collections::HashSet;

use termtree::Tree;
use tracing::instrument;

use crate::domain::item::TreeItem;
use crate::domain::store::IndexedTree;

pub trait TreeDisplay {
    fn to_tree_string(&self, root_label: &str, max_depth: Option<usize>) -> Tree<String>;
}

impl<T: TreeItem> TreeDisplay for IndexedTree<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, root_label: &str, max_depth: Option<usize>) -> Tree<String> {
        fn build<T: TreeItem>(
            tree: &IndexedTree<T>,
            node: &T,
            depth: usize,
            max_depth: Option<usize>,
            seen: &mut HashSet<T::Id>,
        ) -> Tree<String> {
            let mut out = Tree::new(format!("{} [{}]", node.label(), node.id()));
            if max_depth.is_some_and(|max| depth >= max) {
                return out;
            }
            for child in tree.get_children(node.id()) {
                if seen.insert(child.id().clone()) {
                    out.push(build(tree, child, depth + 1, max_depth, seen));
                }
            }
            out
        }

        let mut seen = HashSet::new();
        let mut top = Tree::new(root_label.to_string());
        for root in self.roots() {
            if seen.insert(root.id().clone()) {
                top.push(build(self, root, 1, max_depth, &mut seen));
            }
        }
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{Item, ItemId};

    #[test]
    fn given_forest_when_rendering_then_nests_children() {
        let tree = IndexedTree::new(vec![
            Item::new(1, None, "root"),
            Item::new(2, Some(ItemId::Int(1)), "a"),
            Item::new(3, Some(ItemId::Int(2)), "c"),
        ]);
        let rendered = tree.to_tree_string(".", None).to_string();
        assert_eq!(rendered, ".\n└── root [1]\n    └── a [2]\n        └── c [3]\n");
    }

    #[test]
    fn given_max_depth_when_rendering_then_cuts_below_it() {
        let tree = IndexedTree::new(vec![
            Item::new(1, None, "root"),
            Item::new(2, Some(ItemId::Int(1)), "a"),
        ]);
        let rendered = tree.to_tree_string(".", Some(1)).to_string();
        assert_eq!(rendered, ".\n└── root [1]\n");
    }
}
