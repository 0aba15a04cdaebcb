// Reference numbering over documents loaded from JSON trees

use annotation_wasm::dom::{Document, NodeData, NodeId};
use annotation_wasm::models::is_annotation;
use annotation_wasm::renderers::ReferenceNumberer;
use serde_json::{json, Value};

fn cite(publication: &str, author: &str) -> Value {
    json!({
        "type": "element",
        "tag": "annotation",
        "attributes": {
            "class": "afl-annotation-tool",
            "contenteditable": "false",
            "data-publication": publication,
            "data-author": author
        },
        "children": [{"type": "text", "text": publication}]
    })
}

fn text(value: &str) -> Value {
    json!({"type": "text", "text": value})
}

fn load(paragraphs: Vec<Vec<Value>>) -> Document {
    let children: Vec<Value> = paragraphs
        .into_iter()
        .map(|children| json!({"type": "element", "tag": "p", "children": children}))
        .collect();
    let data: NodeData =
        serde_json::from_value(json!({"type": "element", "tag": "body", "children": children})).unwrap();
    Document::from_data(&data).unwrap()
}

fn annotations(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|id| is_annotation(doc, *id))
        .collect()
}

#[test]
fn test_ordinals_follow_first_occurrence() {
    let mut doc = load(vec![
        vec![text("First "), cite("Alpha", "Doe"), text(" then "), cite("Beta", "Roe")],
        vec![cite("Alpha", "Doe"), text(" and "), cite("Gamma", "Poe"), cite("Beta", "Roe")],
    ]);
    let root = doc.root();

    let map = ReferenceNumberer::renumber(&mut doc, root);

    let labels: Vec<String> = annotations(&doc)
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(labels, vec!["[1]", "[2]", "[1]", "[3]", "[2]"]);
    assert_eq!(map.len(), 3);
    assert_eq!(map.markers.len(), 5);
}

#[test]
fn test_same_publication_different_author_is_distinct() {
    let mut doc = load(vec![vec![cite("Alpha", "Doe"), cite("Alpha", "Roe"), cite("Alpha", "Doe")]]);
    let root = doc.root();

    ReferenceNumberer::renumber(&mut doc, root);

    let labels: Vec<String> = annotations(&doc)
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(labels, vec!["[1]", "[2]", "[1]"]);
}

#[test]
fn test_renumber_is_idempotent() {
    let mut doc = load(vec![vec![cite("Alpha", "Doe"), text(" x "), cite("Beta", "Roe")]]);
    let root = doc.root();

    let first = ReferenceNumberer::renumber(&mut doc, root);
    let html = doc.to_html(root);
    doc.take_mutations();

    let second = ReferenceNumberer::renumber(&mut doc, root);

    assert_eq!(first, second);
    assert_eq!(doc.to_html(root), html);
    assert!(doc.take_mutations().is_empty());
}

#[test]
fn test_numbering_closes_gaps_after_deletion() {
    let mut doc = load(vec![vec![cite("Alpha", "Doe"), cite("Beta", "Roe"), cite("Gamma", "Poe")]]);
    let root = doc.root();
    ReferenceNumberer::renumber(&mut doc, root);

    let beta = annotations(&doc)[1];
    doc.remove(beta).unwrap();
    let map = ReferenceNumberer::renumber(&mut doc, root);

    let labels: Vec<String> = annotations(&doc)
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(labels, vec!["[1]", "[2]"]);
    assert_eq!(map.len(), 2);
}

#[test]
fn test_annotation_without_metadata_keeps_text() {
    let pending = json!({
        "type": "element",
        "tag": "annotation",
        "attributes": {"class": "afl-annotation-tool"},
        "children": [{"type": "text", "text": "still typing"}]
    });
    let mut doc = load(vec![vec![pending, cite("Alpha", "Doe")]]);
    let root = doc.root();

    let map = ReferenceNumberer::renumber(&mut doc, root);

    let nodes = annotations(&doc);
    assert_eq!(doc.text_content(nodes[0]), "still typing");
    assert_eq!(doc.text_content(nodes[1]), "[1]");
    assert_eq!(map.ordinal_for_node(nodes[0]), None);
}

#[test]
fn test_nested_annotation_is_not_numbered() {
    let mut outer = cite("Alpha", "Doe");
    outer["children"] = json!([text("see "), cite("Beta", "Roe")]);
    let mut doc = load(vec![vec![outer, text(" and "), cite("Gamma", "Poe")]]);
    let root = doc.root();
    let inner = annotations(&doc)[1];

    let first = ReferenceNumberer::renumber(&mut doc, root);

    assert!(!doc.is_attached(inner));
    assert_eq!(first.ordinal_for_node(inner), None);
    let labels: Vec<String> = annotations(&doc)
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(labels, vec!["[1]", "[2]"]);
    assert_eq!(first.len(), 2);
    assert_eq!(first.markers.len(), 2);

    let html = doc.to_html(root);
    doc.take_mutations();
    let second = ReferenceNumberer::renumber(&mut doc, root);

    assert_eq!(first, second);
    assert_eq!(doc.to_html(root), html);
    assert!(doc.take_mutations().is_empty());
}
