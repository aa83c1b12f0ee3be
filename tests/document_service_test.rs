//! Tests for DocumentService loading and rendering

use std::path::Path;
use std::sync::Arc;

use rstest::rstest;
use serde_json::Value;

use treestore::application::services::{DocumentFormat, DocumentService};
use treestore::application::ApplicationError;
use treestore::domain::{ItemId, ItemPatch, TreeDisplay, Violation};
use treestore::infrastructure::traits::{MemoryFileSystem, RealFileSystem};

fn real(default_format: DocumentFormat) -> DocumentService {
    DocumentService::new(Arc::new(RealFileSystem), default_format)
}

// ============================================================
// Loading from disk
// ============================================================

#[test]
fn given_json_document_when_loading_then_builds_index() {
    let tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/sample.json"), None)
        .unwrap();

    assert_eq!(tree.len(), 4);
    let chain: Vec<ItemId> = tree
        .get_all_parents(&ItemId::Int(4))
        .iter()
        .map(|i| i.id.clone())
        .collect();
    assert_eq!(chain, vec![ItemId::Int(4), ItemId::Int(2), ItemId::Int(1)]);
    assert_eq!(
        tree.get(&ItemId::Int(4)).unwrap().fields["tags"],
        serde_json::json!(["x", "y"])
    );
}

#[test]
fn given_toml_document_when_loading_then_string_ids_resolve() {
    let tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/sample.toml"), None)
        .unwrap();

    let labels: Vec<&str> = tree
        .get_all_children(&ItemId::from("docs"))
        .iter()
        .map(|i| i.label.as_str())
        .collect();
    assert_eq!(labels.len(), 2);
    assert!(labels.contains(&"Work") && labels.contains(&"Report"));
    assert_eq!(
        tree.get(&ItemId::from("work")).unwrap().fields["owner"],
        Value::from("team")
    );
}

#[rstest]
#[case(DocumentFormat::Toml, true)]
#[case(DocumentFormat::Json, false)]
fn given_unknown_extension_when_loading_then_uses_default_format(
    #[case] default_format: DocumentFormat,
    #[case] parses: bool,
) {
    let result = real(default_format).load(Path::new("tests/resources/documents/items.dat"), None);
    assert_eq!(result.is_ok(), parses);
}

#[test]
fn given_explicit_format_when_loading_then_overrides_extension() {
    let tree = real(DocumentFormat::Json)
        .load(
            Path::new("tests/resources/documents/items.dat"),
            Some(DocumentFormat::Toml),
        )
        .unwrap();
    assert_eq!(tree.len(), 1);
}

#[test]
fn given_missing_file_when_loading_then_fails_with_operation_error() {
    let err = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/nope.json"), None)
        .unwrap_err();
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn given_broken_document_when_validating_then_reports_all_problems() {
    let tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/broken.json"), None)
        .unwrap();
    let violations = tree.validate();

    assert!(violations.contains(&Violation::DuplicateId {
        id: ItemId::Int(1),
        count: 2
    }));
    assert!(violations.contains(&Violation::DanglingParent {
        id: ItemId::Int(5),
        parent: ItemId::Int(99)
    }));
    assert!(violations.contains(&Violation::Cycle { id: ItemId::Int(7) }));
    assert_eq!(violations.len(), 3);
}

// ============================================================
// In-memory filesystem
// ============================================================

#[test]
fn given_memory_filesystem_when_loading_then_reads_through_trait() {
    let fs = MemoryFileSystem::new().with_file(
        "mem/items.json",
        r#"[{"id": "a", "label": "A"}, {"id": "b", "parent": "a", "label": "B"}]"#,
    );
    let service = DocumentService::new(Arc::new(fs), DocumentFormat::Json);
    let tree = service.load(Path::new("mem/items.json"), None).unwrap();

    assert_eq!(tree.get_children(&ItemId::from("a")).len(), 1);
    let rendered = tree.to_tree_string("items", None).to_string();
    assert!(rendered.starts_with("items\n"));
    assert!(rendered.contains("B [b]"));
}

#[test]
fn given_invalid_json_when_loading_then_fails_with_parse_error() {
    let fs = MemoryFileSystem::new().with_file("bad.json", r#"[{"id": 1}]"#);
    let service = DocumentService::new(Arc::new(fs), DocumentFormat::Json);
    let err = service.load(Path::new("bad.json"), None).unwrap_err();
    assert!(matches!(err, ApplicationError::Parse { .. }));
}

// ============================================================
// Rendering
// ============================================================

#[rstest]
#[case(DocumentFormat::Json)]
#[case(DocumentFormat::Toml)]
fn given_mutated_index_when_rendering_then_reloads_to_same_items(#[case] format: DocumentFormat) {
    let mut tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/sample.json"), None)
        .unwrap();
    tree.remove(&ItemId::Int(2));

    let text = DocumentService::render(tree.get_all(), format, true).unwrap();
    let items = DocumentService::parse(&text, format, Path::new("rendered")).unwrap();
    assert_eq!(items.as_slice(), tree.get_all());
}

#[test]
fn given_compact_json_when_rendering_then_emits_single_line() {
    let tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/sample.json"), None)
        .unwrap();
    let text = DocumentService::render(tree.get_all(), DocumentFormat::Json, false).unwrap();
    assert!(!text.contains('\n'));
    assert!(text.starts_with(r#"[{"id":1,"parent":null,"label":"root"}"#));
}

#[rstest]
#[case(DocumentFormat::Json)]
#[case(DocumentFormat::Toml)]
fn given_reserved_field_in_update_when_rendering_then_reloads_with_same_parent(
    #[case] format: DocumentFormat,
) {
    let mut tree = real(DocumentFormat::Json)
        .load(Path::new("tests/resources/documents/sample.json"), None)
        .unwrap();
    tree.update(ItemPatch::new(3).field("parent", 2)).unwrap();

    let text = DocumentService::render(tree.get_all(), format, true).unwrap();
    let items = DocumentService::parse(&text, format, Path::new("rendered")).unwrap();
    let reloaded = treestore::IndexedTree::new(items);

    assert_eq!(reloaded.get(&ItemId::Int(3)).unwrap().parent, Some(ItemId::Int(1)));
    assert_eq!(reloaded.get_all(), tree.get_all());
}
