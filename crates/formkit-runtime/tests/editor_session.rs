//! End-to-end editor sessions: build a form through drops and property
//! edits, save it, load it back, and undo.

use std::sync::Arc;

use formkit_core::model::{ModelTree, NodeId, Properties};
use formkit_core::value::{Binding, Value};
use formkit_runtime::{
    ChangeDetector, DropTarget, EditorHistory, EditorService, MemorySink, NodeDropTarget,
    export_document, from_json, import_document, save_document,
};
use formkit_template::RenderMode;
use formkit_widgets::{DragPayload, DragSource, catalog};

// ── Helpers ─────────────────────────────────────────────────────────────

fn editor() -> EditorService {
    EditorService::new(Arc::new(catalog::standard().unwrap()))
}

fn drop_new(tree: &mut ModelTree, history: &mut EditorHistory, target: NodeId, component: &str) -> NodeId {
    let payload = history.editor().registry().component(component).unwrap().payload();
    NodeDropTarget::new(target, history)
        .dropped(tree, &payload)
        .unwrap()
        .node()
        .unwrap()
}

/// body > form > row > col > label, built through the history.
fn build(history: &mut EditorHistory) -> (ModelTree, NodeId, NodeId) {
    let mut tree = ModelTree::new();
    let body = history
        .editor()
        .instantiate(&mut tree, &history.editor().registry().component("body").unwrap().create())
        .unwrap();
    let form = drop_new(&mut tree, history, body, "form");
    let row = drop_new(&mut tree, history, form, "row");
    let col = drop_new(&mut tree, history, row, "col");
    let label = drop_new(&mut tree, history, col, "label");
    (tree, body, label)
}

// ═════════════════════════════════════════════════════════════════════════
// Session
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn build_edit_save_and_reload() {
    let mut history = EditorHistory::new(editor());
    let (mut tree, body, label) = build(&mut history);
    assert_eq!(history.history().len(), 4);

    history.select(&tree, Some(label)).unwrap();
    let previous = history
        .editor()
        .set_property(&mut tree, label, "value", Binding::expression("user.email").into())
        .unwrap();
    assert_eq!(previous, Some(Value::Binding(Binding::literal(""))));
    history.object_changed(&mut tree).unwrap();
    assert_eq!(history.history().labels()[0], "property change");

    let rendered = history.editor().registry().render(&tree, body, RenderMode::Run);
    assert!(rendered.contains("{{user.email}}"), "{rendered}");

    let sink = MemorySink::new();
    let document = export_document(history.editor(), &tree, body).unwrap();
    save_document(&sink, &document, "form.json").unwrap();
    history.clear();
    assert!(!history.is_dirty());

    let json = String::from_utf8(sink.get("form.json").unwrap().unwrap()).unwrap();
    let mut loaded = ModelTree::new();
    let root = import_document(history.editor(), &mut loaded, &from_json(&json).unwrap()).unwrap();
    assert_eq!(
        history.editor().registry().render(&loaded, root, RenderMode::Run),
        rendered
    );
    assert_eq!(
        history.editor().registry().render(&loaded, root, RenderMode::Edit),
        history.editor().registry().render(&tree, body, RenderMode::Edit)
    );
}

#[test]
fn undo_walks_back_through_edits_and_drops() {
    let mut history = EditorHistory::new(editor());
    let (mut tree, body, label) = build(&mut history);
    let col = tree.parent(label).unwrap();

    history.select(&tree, Some(label)).unwrap();
    history
        .editor()
        .set_property(&mut tree, label, "name", Value::from("email"))
        .unwrap();
    history.object_changed(&mut tree).unwrap();

    history.undo(&mut tree).unwrap();
    assert_eq!(tree[label].value("name"), Some(&Value::from("")));
    history.undo(&mut tree).unwrap();
    assert!(tree.children(col).is_empty());

    assert_eq!(history.revert(&mut tree).unwrap(), 3);
    assert!(tree.children(body).is_empty());
}

#[test]
fn rejected_property_edit_is_not_recorded() {
    let mut history = EditorHistory::new(editor());
    let (mut tree, _, label) = build(&mut history);
    history.select(&tree, Some(label)).unwrap();

    let before = tree[label].clone();
    assert!(
        history
            .editor()
            .set_property(&mut tree, label, "value", Value::from(3))
            .is_err()
    );
    assert_eq!(tree[label], before);
    assert_eq!(history.history().len(), 4);
}

#[test]
fn detector_sees_drops_into_a_container() {
    let mut history = EditorHistory::new(editor());
    let (mut tree, _, label) = build(&mut history);
    let col = tree.parent(label).unwrap();
    let registry = catalog::standard().unwrap();
    let mut detector = ChangeDetector::for_component(registry.component("col").unwrap(), &tree[col]);

    assert!(!detector.check(&tree[col]));
    drop_new(&mut tree, &mut history, col, "button");
    assert!(detector.check(&tree[col]));
    assert!(!detector.check(&tree[col]));

    let moved = DragPayload::moving(label, "label");
    let form = tree.parent(tree.parent(col).unwrap()).unwrap();
    let result = NodeDropTarget::new(form, &mut history)
        .dropped(&mut tree, &moved)
        .unwrap();
    assert!(result.is_accepted());
    assert!(detector.check(&tree[col]));
    assert_eq!(tree[form].component_id(), "form");
}

#[test]
fn undoing_a_drop_into_a_reloaded_container_restores_it_exactly() {
    let mut history = EditorHistory::new(editor());
    let json = r#"{"version":1,"root":{"id":"body","children":[{"id":"form"}]}}"#;
    let mut tree = ModelTree::new();
    let body = import_document(history.editor(), &mut tree, &from_json(json).unwrap()).unwrap();
    let form = tree.children(body)[0];
    assert_eq!(tree[form].children(), None);
    let before = tree.clone();

    let label = drop_new(&mut tree, &mut history, form, "label");
    assert_eq!(tree.children(form), &[label]);
    assert!(history.undo(&mut tree).unwrap());

    assert_eq!(tree[form].children(), None);
    for id in before.descendants(body) {
        assert_eq!(tree[id], before[id], "node {id} differs after undo");
    }
}
