//! Item model: the trait the index is generic over, the normalized parent key,
//! partial updates, and the concrete `Item` used by documents and the CLI.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anything the index can hold: an identifier, an optional parent and a label.
///
/// Other fields of the implementing type are carried through untouched.
pub trait TreeItem {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    fn id(&self) -> &Self::Id;

    /// `None` places the item at the root.
    fn parent(&self) -> Option<&Self::Id>;

    fn label(&self) -> &str;
}

/// Normalized parent reference, used as the key of the children index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentKey<Id> {
    Root,
    Node(Id),
}

impl<Id: Clone> ParentKey<Id> {
    pub fn from_parent(parent: Option<&Id>) -> Self {
        match parent {
            Some(id) => ParentKey::Node(id.clone()),
            None => ParentKey::Root,
        }
    }

    pub fn of<T: TreeItem<Id = Id>>(item: &T) -> Self {
        Self::from_parent(item.parent())
    }
}

impl<Id> ParentKey<Id> {
    pub fn as_node(&self) -> Option<&Id> {
        match self {
            ParentKey::Root => None,
            ParentKey::Node(id) => Some(id),
        }
    }
}

impl<Id: fmt::Display> fmt::Display for ParentKey<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentKey::Root => write!(f, "<root>"),
            ParentKey::Node(id) => write!(f, "{}", id),
        }
    }
}

/// A partial change set for one item.
///
/// The patch names the item it applies to; `apply` merges the changed fields
/// over the existing item and must leave the identifier alone.
pub trait Patch<T: TreeItem> {
    fn id(&self) -> &T::Id;
    fn apply(self, item: &mut T);
}

/// Identifier of a document item: documents use both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(n) => write!(f, "{}", n),
            ItemId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for ItemId {
    type Err = std::convert::Infallible;

    /// Digits become `Int`, anything else stays a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(ItemId::Int)
            .unwrap_or_else(|_| ItemId::Str(s.to_string())))
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Int(n)
    }
}

impl From<i32> for ItemId {
    fn from(n: i32) -> Self {
        ItemId::Int(n.into())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Str(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Str(s)
    }
}

/// Keys owned by the typed `Item` fields; never valid as extra fields.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "parent", "label"];

pub fn is_reserved_field(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

/// Document item: id, parent, label and whatever else the document carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub parent: Option<ItemId>,
    pub label: String,
    /// Extra fields, preserved verbatim
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, parent: Option<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent,
            label: label.into(),
            fields: Map::new(),
        }
    }

    /// Add an extra field. Reserved keys are ignored, set the typed fields instead.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved_field(&key) {
            self.fields.insert(key, value.into());
        }
        self
    }
}

impl TreeItem for Item {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn parent(&self) -> Option<&ItemId> {
        self.parent.as_ref()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Partial update for an `Item`.
///
/// `parent: Some(None)` moves the item to the root, `parent: None` leaves it
/// where it is. Extra fields are merged key by key.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPatch {
    pub id: ItemId,
    pub parent: Option<Option<ItemId>>,
    pub label: Option<String>,
    pub fields: Map<String, Value>,
}

impl ItemPatch {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: None,
            fields: Map::new(),
        }
    }

    pub fn parent(mut self, parent: Option<ItemId>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Reserved keys are ignored, use `parent` and `label`.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved_field(&key) {
            self.fields.insert(key, value.into());
        }
        self
    }
}

impl Patch<Item> for ItemPatch {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn apply(self, item: &mut Item) {
        if let Some(parent) = self.parent {
            item.parent = parent;
        }
        if let Some(label) = self.label {
            item.label = label;
        }
        item.fields.extend(
            self.fields
                .into_iter()
                .filter(|(key, _)| !is_reserved_field(key)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_numeric_string_when_parsing_item_id_then_returns_int() {
        assert_eq!("42".parse::<ItemId>().unwrap(), ItemId::Int(42));
        assert_eq!("a-1".parse::<ItemId>().unwrap(), ItemId::Str("a-1".into()));
    }

    #[test]
    fn given_json_with_extra_fields_when_deserializing_then_keeps_them() {
        let item: Item =
            serde_json::from_str(r#"{"id": 2, "parent": 1, "label": "a", "size": 10}"#).unwrap();
        assert_eq!(item.id, ItemId::Int(2));
        assert_eq!(item.parent, Some(ItemId::Int(1)));
        assert_eq!(item.fields.get("size"), Some(&Value::from(10)));
    }

    #[test]
    fn given_null_parent_when_deserializing_then_item_is_root() {
        let item: Item = serde_json::from_str(r#"{"id": "r", "parent": null, "label": "root"}"#)
            .unwrap();
        assert_eq!(ParentKey::of(&item), ParentKey::Root);
    }

    #[test]
    fn given_patch_when_applied_then_omitted_fields_are_kept() {
        let mut item = Item::new(3, Some(1.into()), "b").with_field("color", "red");
        ItemPatch::new(3).parent(Some(2.into())).field("size", 5).apply(&mut item);

        assert_eq!(item.parent, Some(ItemId::Int(2)));
        assert_eq!(item.label, "b");
        assert_eq!(item.fields.get("color"), Some(&Value::from("red")));
        assert_eq!(item.fields.get("size"), Some(&Value::from(5)));
    }

    #[test]
    fn given_patch_to_root_when_applied_then_parent_is_cleared() {
        let mut item = Item::new(3, Some(1.into()), "b");
        ItemPatch::new(3).parent(None).apply(&mut item);
        assert_eq!(item.parent, None);
    }

    #[test]
    fn given_reserved_key_when_adding_field_then_it_is_ignored() {
        let item = Item::new(3, Some(1.into()), "b")
            .with_field("parent", 2)
            .with_field("label", "other")
            .with_field("color", "red");
        assert_eq!(item.parent, Some(ItemId::Int(1)));
        assert_eq!(item.label, "b");
        assert_eq!(item.fields.len(), 1);

        let patch = ItemPatch::new(3).field("id", 30).field("parent", 2);
        assert!(patch.fields.is_empty());
    }

    #[test]
    fn given_reserved_key_in_patch_fields_when_applied_then_item_serializes_once_per_key() {
        let mut item = Item::new(3, Some(1.into()), "b");
        let mut patch = ItemPatch::new(3);
        patch.fields.insert("parent".into(), Value::from(2));
        patch.fields.insert("size".into(), Value::from(5));
        patch.apply(&mut item);

        assert_eq!(item.parent, Some(ItemId::Int(1)));
        assert!(!item.fields.contains_key("parent"));
        let json = serde_json::to_string(&item).unwrap();
        let reparsed: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, item);
    }
}
