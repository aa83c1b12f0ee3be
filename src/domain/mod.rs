//! Domain layer: the indexed tree and its item model
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod display;
pub mod error;
pub mod item;
pub mod store;
pub mod validate;

pub use display::TreeDisplay;
pub use error::{DomainError, DomainResult};
pub use item::{is_reserved_field, Item, ItemId, ItemPatch, ParentKey, Patch, TreeItem};
pub use store::IndexedTree;
pub use validate::Violation;
