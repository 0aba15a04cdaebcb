// Annotation lifecycle: create, save, reopen, cancel, remove

use annotation_wasm::dom::{Boundary, Document, NodeData, NodeId, Range};
use annotation_wasm::models::{is_annotation, Field, LISTENER_MARKER};
use annotation_wasm::tool::{
    AnnotationTool, CloseOutcome, CommandQueue, HostCommand, LifecycleError, NoticeStyle, SessionOrigin,
    ToolConfig,
};

struct Fixture {
    doc: Document,
    host: CommandQueue,
    tool: AnnotationTool,
    paragraph: NodeId,
}

fn fixture(text: &str) -> Fixture {
    fixture_with(vec![NodeData::text(text)])
}

fn fixture_with(paragraph: Vec<NodeData>) -> Fixture {
    let data = NodeData::element("body", vec![NodeData::element("p", paragraph)]);
    let mut doc = Document::from_data(&data).expect("valid tree");
    let mut host = CommandQueue::new();
    let tool = AnnotationTool::new(ToolConfig::default(), &mut doc, &mut host);
    let paragraph = doc.children(doc.root())[0];
    Fixture {
        doc,
        host,
        tool,
        paragraph,
    }
}

impl Fixture {
    /// Select characters `from..to` of the paragraph's first text node and wrap them
    fn surround(&mut self, from: usize, to: usize) -> NodeId {
        let text = self.doc.children(self.paragraph)[0];
        let range = Range::new(Boundary::new(text, from), Boundary::new(text, to));
        self.tool
            .surround(&mut self.doc, &mut self.host, Some(range))
            .expect("surround should open the overlay");
        self.tool.session().expect("session open").anchor()
    }

    fn fill(&mut self, publication: &str, author: &str) {
        self.tool.update_field(Field::Publication, publication).unwrap();
        self.tool.update_field(Field::Author, author).unwrap();
    }

    fn disconnects(&self) -> usize {
        self.host
            .count(|c| matches!(c, HostCommand::DisconnectResize { .. }))
    }
}

#[test]
fn test_save_rejected_without_author() {
    let mut f = fixture("See Smith et al. for details");
    let anchor = f.surround(4, 16);

    f.fill("X", "");
    let err = f.tool.save(&mut f.doc, &mut f.host).unwrap_err();

    match err {
        LifecycleError::Validation(report) => {
            assert!(!report.valid);
            assert!(report.errors.contains_key(&Field::Author));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(f.tool.state().name(), "Editing");
    assert_eq!(f.tool.session().unwrap().anchor(), anchor);
    for field in Field::ALL {
        assert_eq!(f.doc.attribute(anchor, field.attribute()), None);
    }
    assert_eq!(f.disconnects(), 0);

    let notices: Vec<_> = f
        .host
        .commands()
        .iter()
        .filter_map(|c| match c {
            HostCommand::Notify { notice } => Some(notice.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].style, NoticeStyle::Error);
    assert_eq!(notices[0].message, "Authors is required");

    let view = f.tool.overlay_view().unwrap();
    assert_eq!(view.fields[1].error.as_deref(), Some("Authors is required"));
}

#[test]
fn test_cancel_restores_original_content() {
    let mut f = fixture("See Smith et al. for details");
    let before = f.doc.to_html(f.doc.root());

    let anchor = f.surround(4, 16);
    assert_ne!(f.doc.to_html(f.doc.root()), before);

    let outcome = f.tool.close(&mut f.doc, &mut f.host).unwrap();

    assert_eq!(outcome, CloseOutcome::Unwrapped);
    assert!(!f.doc.is_attached(anchor));
    assert_eq!(f.doc.to_html(f.doc.root()), before);
    assert!(f.tool.state().is_idle());
    assert_eq!(f.disconnects(), 1);
}

#[test]
fn test_cancel_rejoins_element_split_by_selection() {
    let mut f = fixture_with(vec![
        NodeData::text("Hello "),
        NodeData::element("b", vec![NodeData::text("world")]),
    ]);
    let before = f.doc.to_html(f.doc.root());
    let hello = f.doc.children(f.paragraph)[0];
    let bold = f.doc.children(f.paragraph)[1];
    let world = f.doc.children(bold)[0];

    let range = Range::new(Boundary::new(hello, 2), Boundary::new(world, 3));
    f.tool.surround(&mut f.doc, &mut f.host, Some(range)).unwrap();
    f.tool.close(&mut f.doc, &mut f.host).unwrap();

    assert_eq!(f.doc.to_html(f.doc.root()), before);
    let kinds: Vec<_> = f
        .doc
        .children(f.paragraph)
        .iter()
        .map(|id| f.doc.tag(*id).map(str::to_owned))
        .collect();
    assert_eq!(kinds, vec![None, Some("b".to_owned())]);
    assert_eq!(f.doc.text_content(f.doc.children(f.paragraph)[1]), "world");
}

#[test]
fn test_cancel_rejoins_when_selection_starts_inside_element() {
    let mut f = fixture_with(vec![
        NodeData::element("b", vec![NodeData::text("Hello")]),
        NodeData::text(" world"),
    ]);
    let before = f.doc.to_html(f.doc.root());
    let bold = f.doc.children(f.paragraph)[0];
    let hello = f.doc.children(bold)[0];
    let world = f.doc.children(f.paragraph)[1];

    let range = Range::new(Boundary::new(hello, 2), Boundary::new(world, 3));
    f.tool.surround(&mut f.doc, &mut f.host, Some(range)).unwrap();
    assert_ne!(f.doc.to_html(f.doc.root()), before);
    f.tool.close(&mut f.doc, &mut f.host).unwrap();

    assert_eq!(f.doc.to_html(f.doc.root()), before);
    assert_eq!(f.doc.children(f.paragraph).len(), 2);
}

#[test]
fn test_save_writes_escaped_metadata_and_renumbers() {
    let mut f = fixture("As shown in Fig. 2");
    let anchor = f.surround(3, 8);

    f.fill("Rust & <WASM>", "Doe J., Smith J.");
    f.tool.update_field(Field::Year, "2021").unwrap();
    f.tool.save(&mut f.doc, &mut f.host).unwrap();

    assert!(f.tool.state().is_idle());
    assert_eq!(
        f.doc.attribute(anchor, "data-publication"),
        Some("Rust &amp; &lt;WASM&gt;")
    );
    assert_eq!(f.doc.attribute(anchor, "data-year"), Some("2021"));
    assert_eq!(f.doc.attribute(anchor, "data-journal"), Some(""));
    assert_eq!(f.doc.text_content(anchor), "[1]");
    assert_eq!(f.tool.references().ordinal_for_node(anchor), Some(1));
    assert_eq!(f.disconnects(), 1);
}

#[test]
fn test_reopen_populates_decoded_values() {
    let mut f = fixture("As shown in Fig. 2");
    let anchor = f.surround(3, 8);
    f.fill("Rust & <WASM>", "Doe J.");
    f.tool.save(&mut f.doc, &mut f.host).unwrap();

    f.tool.edit_annotation(&mut f.doc, &mut f.host, anchor).unwrap();

    let session = f.tool.session().unwrap();
    assert_eq!(session.origin(), SessionOrigin::Reopened);
    assert!(!session.is_committed());
    let view = f.tool.overlay_view().unwrap();
    assert_eq!(view.fields[0].value, "Rust & <WASM>");
    assert_eq!(view.fields[1].value, "Doe J.");

    // existing metadata keeps the node even without a new save
    assert_eq!(f.tool.close(&mut f.doc, &mut f.host).unwrap(), CloseOutcome::Kept);
    assert!(f.doc.is_attached(anchor));
    assert_eq!(f.doc.text_content(anchor), "[1]");
}

#[test]
fn test_save_and_close_are_exclusive() {
    let mut f = fixture("Some cited text");
    f.surround(5, 10);
    f.fill("Title", "Author");

    f.tool.save(&mut f.doc, &mut f.host).unwrap();
    assert_eq!(
        f.tool.close(&mut f.doc, &mut f.host),
        Err(LifecycleError::MissingAnchor)
    );
    assert_eq!(
        f.tool.save(&mut f.doc, &mut f.host),
        Err(LifecycleError::MissingAnchor)
    );
    assert_eq!(f.disconnects(), 1);
}

#[test]
fn test_remove_keeps_publication_title() {
    let mut f = fixture("Read this paper today");
    let anchor = f.surround(5, 15);
    f.fill("On Ownership & Borrowing", "Doe J.");
    f.tool.save(&mut f.doc, &mut f.host).unwrap();

    f.tool.edit_annotation(&mut f.doc, &mut f.host, anchor).unwrap();
    f.tool.remove(&mut f.doc, &mut f.host).unwrap();

    assert!(!f.doc.is_attached(anchor));
    assert_eq!(
        f.doc.text_content(f.paragraph),
        "Read On Ownership & Borrowing today"
    );
    assert!(f.tool.references().is_empty());
    assert!(f.tool.state().is_idle());
    assert_eq!(f.disconnects(), 2);
}

#[test]
fn test_listeners_attached_once() {
    let json = serde_json::json!({
        "type": "element",
        "tag": "body",
        "children": [{
            "type": "element",
            "tag": "p",
            "children": [
                {"type": "text", "text": "Cited "},
                {
                    "type": "element",
                    "tag": "annotation",
                    "attributes": {
                        "class": "afl-annotation-tool",
                        "data-publication": "P",
                        "data-author": "A"
                    },
                    "children": [{"type": "text", "text": "[1]"}]
                }
            ]
        }]
    });
    let data: NodeData = serde_json::from_value(json).unwrap();
    let mut doc = Document::from_data(&data).unwrap();
    let mut host = CommandQueue::new();

    let first = AnnotationTool::new(ToolConfig::default(), &mut doc, &mut host);
    let annotations: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|id| is_annotation(&doc, *id))
        .collect();
    assert_eq!(annotations.len(), 1);
    assert_eq!(doc.attribute(annotations[0], LISTENER_MARKER), Some("true"));

    first.attach_listeners_to_all(&mut doc, &mut host);
    let _second = AnnotationTool::new(ToolConfig::default(), &mut doc, &mut host);

    assert_eq!(
        host.count(|c| matches!(c, HostCommand::AttachClickListener { .. })),
        1
    );
}

#[test]
fn test_click_on_plain_node_is_noop() {
    let mut f = fixture("plain");
    let paragraph = f.paragraph;
    assert_eq!(
        f.tool.edit_annotation(&mut f.doc, &mut f.host, paragraph),
        Err(LifecycleError::MissingAnchor)
    );
    assert!(f.tool.state().is_idle());
    assert!(f.host.commands().iter().all(|c| !matches!(c, HostCommand::OpenOverlay { .. })));
}
