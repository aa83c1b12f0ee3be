//! treestore: in-memory hierarchical index over flat item collections
//!
//! Layers, innermost first:
//! - `domain`: [`domain::IndexedTree`] and the item model, no I/O
//! - `application`: document loading and rendering
//! - `infrastructure`: filesystem boundary and service wiring
//! - `cli`: argument parsing, dispatch, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{DomainError, IndexedTree, Item, ItemId, ItemPatch, ParentKey, Patch, TreeItem};
