//! Cross-module contracts of the standard catalog: defaults, stripping,
//! nesting rules and rendering of whole trees.

use formkit_core::model::{ModelNode, ModelTree, Properties};
use formkit_core::value::{Binding, Value};
use formkit_template::{RenderMode, TemplateConfig};
use formkit_widgets::catalog;
use formkit_widgets::{ComponentRegistry, DragSource, UIComponent};
use proptest::prelude::*;

fn registry() -> ComponentRegistry {
    catalog::standard().unwrap()
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn concrete(registry: &ComponentRegistry) -> Vec<&UIComponent> {
    registry.components().filter(|c| !c.is_abstract()).collect()
}

// ═════════════════════════════════════════════════════════════════════════
// Defaults
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn stripping_a_fresh_default_leaves_only_the_id() {
    let registry = registry();
    for component in concrete(&registry) {
        let mut doc = component.create();
        component.delete_defaults(&mut doc);
        assert!(doc.properties.is_empty(), "{}: {:?}", component.id(), doc.properties);
        assert_eq!(doc.children, None);
    }
}

#[test]
fn add_defaults_restores_what_delete_defaults_removed() {
    let registry = registry();
    let textarea = registry.component("textarea").unwrap();
    let original = textarea.create_default();
    let mut stripped = original.clone();
    textarea.delete_defaults(&mut stripped);
    textarea.add_defaults(&mut stripped);
    assert_eq!(stripped.properties, original.properties);
}

#[test]
fn binding_properties_default_to_literal_wrappers() {
    let registry = registry();
    let input = registry.component("input").unwrap();
    let doc = input.create_default();
    assert_eq!(doc.value("placeholder"), Some(&Value::Binding(Binding::literal(""))));
    assert_eq!(doc.value("required"), Some(&Value::Binding(Binding::literal(false))));
    assert!(!doc.has_value("model"));
}

// ═════════════════════════════════════════════════════════════════════════
// Nesting
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn grid_nesting_rules() {
    let registry = registry();
    assert!(registry.component("col").unwrap().is_valid_parent("row"));
    assert!(!registry.component("col").unwrap().is_valid_parent("body"));
    assert!(registry.component("row").unwrap().is_valid_parent("body"));
    assert!(registry.component("button").unwrap().is_valid_parent("col"));
    assert!(!registry.component("button").unwrap().is_valid_parent("form"));
}

// ═════════════════════════════════════════════════════════════════════════
// Rendering
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn form_tree_renders_in_run_mode() {
    let registry = registry();
    let mut tree = ModelTree::new();
    let form = tree.insert(ModelNode::container("form").with_value("name", "signup"));
    let row = tree.insert(ModelNode::container("row"));
    let col = tree.insert(ModelNode::container("col").with_value("columns", 4));
    let button = tree.insert(
        ModelNode::new("button")
            .with_value("text", Binding::expression("labels.submit"))
            .with_value("click", "save()"),
    );
    tree.append_child(form, row).unwrap();
    tree.append_child(row, col).unwrap();
    tree.append_child(col, button).unwrap();

    let html = registry.render(&tree, form, RenderMode::Run);
    assert!(html.starts_with("<form name=\"signup\" novalidate='' "));
    assert!(html.contains("<div class='col col-md-4 col-md-offset-0'>"));
    assert!(html.contains(r#"(click)="save()""#));
    assert!(html.contains(">{{labels.submit}}</button>"));
    assert!(html.ends_with("</div></div></form>"));
}

#[test]
fn edit_mode_hides_expressions_and_run_only_attributes() {
    let registry = registry();
    let mut tree = ModelTree::new();
    let input = tree.insert(
        ModelNode::new("input")
            .with_value("name", "email")
            .with_value("placeholder", Binding::expression("hints.email"))
            .with_value("required", Binding::literal(true)),
    );
    let edit = registry.render(&tree, input, RenderMode::Edit);
    assert!(edit.contains("name=\"email\""));
    assert!(!edit.contains("hints.email"));
    assert!(!edit.contains("[required]"));
    assert!(edit.contains("disabled"));

    let run = registry.render(&tree, input, RenderMode::Run);
    assert!(run.contains(r#"placeholder="hints.email""#));
    assert!(run.contains(r#"[required]="true""#));
}

#[test]
fn custom_markers_apply_to_the_whole_catalog() {
    let config = TemplateConfig::default().with_binding_markers("[[", "]]");
    let registry = catalog::builder().build_with(&config).unwrap();
    let mut tree = ModelTree::new();
    let id = tree.insert(ModelNode::new("h2").with_value("value", Binding::expression("title")));
    assert_eq!(registry.render(&tree, id, RenderMode::Run), "<h2 >[[title]]</h2>");
    assert_eq!(registry.config().binding_open, "[[");
}

// ═════════════════════════════════════════════════════════════════════════
// Properties
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn attribute_records_render_one_pair_per_key(
        attrs in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9 ]{0,8}", 0..5)
    ) {
        let registry = registry();
        let record = Value::record(attrs.iter().map(|(k, v)| (k.clone(), Value::from(v.as_str()))));
        let mut tree = ModelTree::new();
        let id = tree.insert(ModelNode::new("br").with_value("attributes", record));
        let html = registry.render(&tree, id, RenderMode::Run);
        let expected: String = attrs.iter().map(|(k, v)| format!(" {k}=\"{v}\"")).collect();
        prop_assert_eq!(html, format!("<br {expected}>"));
    }
}
