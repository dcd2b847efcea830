use pretty_assertions::assert_eq;
use selection_engine::DisplayMode;
use selection_engine::SelectionError;
use selection_engine::SelectionRequest;
use selection_engine::SelectionSource;
use serde_json::json;

use crate::common::resolver;

fn write_selection(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("selection.graphql");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn override_is_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_selection(
        &dir,
        "# product listing\ntitle\nvariants(first: 5) {\n  nodes { sku }\n}\n",
    );
    let request = SelectionRequest {
        selection_override: Some(SelectionSource::parse_arg(&format!(
            "@file:{}",
            path.display()
        ))),
        field_paths: vec!["collections.edges.node.title".to_string()],
        require_id: true,
        ..SelectionRequest::new(DisplayMode::Raw)
    };
    let selection = resolver().resolve(&request).unwrap();
    assert_eq!(
        serde_json::to_value(&selection).unwrap(),
        json!({
            "title": true,
            "variants": { "__args": { "first": 5 }, "nodes": { "sku": true } },
            "collections": {
                "__args": { "first": 50 },
                "pageInfo": { "hasNextPage": true, "endCursor": true },
                "edges": { "node": { "title": true } }
            },
            "id": true
        })
    );
}

#[test]
fn grammar_errors_locate_the_problem_in_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_selection(&dir, "{\n  title\n  price(currency: USD)\n}\n");
    let request = SelectionRequest {
        selection_override: Some(SelectionSource::parse_arg(&format!("@{}", path.display()))),
        ..SelectionRequest::new(DisplayMode::Raw)
    };
    let error = resolver().resolve(&request).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Invalid selection: field `price` has arguments but no selection set at line 3, column 3"
    );
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let request = SelectionRequest {
        selection_override: Some(SelectionSource::File(dir.path().join("missing.graphql"))),
        ..SelectionRequest::new(DisplayMode::Raw)
    };
    let error = resolver().resolve(&request).unwrap_err();
    assert!(matches!(error, SelectionError::ReadSource { .. }));
    assert!(error.to_string().contains("missing.graphql"));
}
