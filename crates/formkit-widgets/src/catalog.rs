#![forbid(unsafe_code)]

//! The standard component catalog.
//!
//! Two abstract kinds carry the shared properties: `base` (name, css class,
//! free-form attributes) and `style` (box model, font, and the synthesized
//! `style` attribute). Every concrete kind inherits from one or both and adds
//! its own template, palette group and nesting rules.
//!
//! The `row`/`col` grid kinds decorate a [`GridCells`] target after
//! rendering: the classes the editor applies to the hosting element and the
//! placeholder cells that pad a row to twelve columns.

use std::any::Any;

use formkit_core::model::{ModelNode, ModelTree, NodeId, Properties};
use formkit_core::property::{Property, PropertyBuilder, PropertyType};
use formkit_core::types::TypeDescriptor;
use formkit_core::value::Value;

use crate::component::{ComponentBuilder, Orientation, UIComponent};
use crate::error::RegistryError;
use crate::registry::{ComponentRegistry, RegistryBuilder};

/// Number of grid columns in a row.
pub const GRID_COLUMNS: i64 = 12;

const DEFAULT_COLUMNS: i64 = 2;

const TEXT_PARENTS: [&str; 4] = ["col", "div", "form", "fieldset"];
const CONTAINER_PARENTS: [&str; 4] = ["body", "form", "col", "fieldset"];

// ---------------------------------------------------------------------------
// Decoration target
// ---------------------------------------------------------------------------

/// Decoration target for grid components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCells {
    /// Classes for the element hosting the rendered node.
    pub classes: Vec<String>,
    /// Class lists of the placeholder cells appended to a row.
    pub placeholders: Vec<String>,
}

impl GridCells {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

fn decorate_row(tree: &ModelTree, id: NodeId, target: &mut dyn Any) {
    let Some(cells) = target.downcast_mut::<GridCells>() else {
        return;
    };
    let children = tree.children(id);
    let mut count: i64 = children
        .iter()
        .filter_map(|&child| tree.get(child))
        .map(|child| {
            number_or(child, "columns", DEFAULT_COLUMNS) + number_or(child, "offset", 0)
        })
        .sum();

    cells.classes = vec!["row".into(), "form-edit".into()];
    while count < GRID_COLUMNS {
        let parity = if count % 2 == 0 { "odd" } else { "even" };
        cells
            .placeholders
            .push(format!("form-edit col-md-1 col-placeholder col-placeholder-{parity}"));
        count += 1;
    }
    if children.is_empty() {
        cells.classes.push("rowBackground".into());
    }
}

fn decorate_col(tree: &ModelTree, id: NodeId, target: &mut dyn Any) {
    let Some(cells) = target.downcast_mut::<GridCells>() else {
        return;
    };
    let Some(node) = tree.get(id) else {
        return;
    };
    let columns = number_or(node, "columns", DEFAULT_COLUMNS);
    let offset = number_or(node, "offset", 0);
    cells.classes = vec![
        "col".into(),
        "form-edit".into(),
        format!("col-md-{columns}"),
        format!("col-md-offset-{offset}"),
    ];
    if tree.children(id).is_empty() {
        cells.classes.push("columnBackground".into());
    }
}

/// Truthy numeric field of `node`, or `fallback`.
fn number_or(node: &ModelNode, name: &str, fallback: i64) -> i64 {
    node.value(name)
        .and_then(Value::as_f64)
        .filter(|n| *n != 0.0 && n.is_finite())
        .map_or(fallback, |n| n.trunc() as i64)
}

// ---------------------------------------------------------------------------
// Render hooks
// ---------------------------------------------------------------------------

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::List(_) | Value::Record(_) | Value::Binding(_) => true,
    }
}

fn render_attributes(_node: &ModelNode, value: &Value) -> String {
    value
        .as_record()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| format!(" {key}=\"{}\"", value.to_markup()))
                .collect()
        })
        .unwrap_or_default()
}

const FONT_RULES: [(&str, &str); 6] = [
    ("weight", "font-weight"),
    ("size", "font-size"),
    ("family", "font-family"),
    ("align", "text-align"),
    ("style", "font-style"),
    ("color", "color"),
];

const SIDES: [&str; 4] = ["left", "top", "right", "bottom"];

fn render_style(node: &ModelNode, _value: &Value) -> String {
    let mut style = String::new();
    if let Some(font) = node.value("font") {
        for (field, rule) in FONT_RULES {
            if let Some(value) = font.field(field).filter(is_truthy) {
                style.push_str(&format!("{rule}: {};", value.to_markup()));
            }
        }
    }
    if let Some(spacing) = node.value("box") {
        for kind in ["padding", "margin"] {
            for side in SIDES {
                if let Some(value) = spacing.field(&format!("{kind}{side}")).filter(is_truthy) {
                    style.push_str(&format!("{kind}-{side}: {}px;", value.to_markup()));
                }
            }
        }
    }
    if style.is_empty() {
        style
    } else {
        format!("style=\"{style}\"")
    }
}

// ---------------------------------------------------------------------------
// Property shorthands
// ---------------------------------------------------------------------------

/// A binding-capable text property defaulting to an empty literal.
fn text_binding(name: &str) -> PropertyBuilder {
    Property::builder(name)
        .ty(PropertyType::String)
        .default_value("")
        .binding(true)
        .composite(["kind", "value"])
}

/// A binding-capable boolean defaulting to `false`.
fn flag_binding(name: &str) -> PropertyBuilder {
    Property::builder(name)
        .ty(PropertyType::Boolean)
        .default_value(false)
        .binding(true)
        .composite(["kind", "value"])
}

fn heading(level: u8) -> ComponentBuilder {
    UIComponent::builder(format!("h{level}"))
        .template(format!("<h{level} $r:attributes$>${{value}}$</h{level}>"))
        .label(format!("H{level}"))
        .icon("font")
        .inherits(["base"])
        .group("Widgets")
        .valid_parents(TEXT_PARENTS)
        .property(text_binding("value").tooltip("the text value"))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Builder preloaded with the standard catalog; register more kinds before
/// calling [`build`](RegistryBuilder::build).
pub fn builder() -> RegistryBuilder {
    let mut builder = RegistryBuilder::new()
        .register(
            UIComponent::builder("base")
                .abstract_kind()
                .property(Property::builder("name").default_value("").tooltip("the technical name"))
                .property(
                    Property::builder("class")
                        .default_value("")
                        .group("Advanced")
                        .tooltip("the css class"),
                )
                .property(
                    Property::builder("attributes")
                        .ty(PropertyType::Record)
                        .default_with(Value::empty_record)
                        .render_with(render_attributes)
                        .tooltip("arbitrary html attributes")
                        .editor("<attribute-editor></attribute-editor>"),
                )
                .property(Property::builder("$counter").artificial(true)),
        )
        .register(
            UIComponent::builder("style")
                .abstract_kind()
                .property(
                    Property::builder("box")
                        .ty(PropertyType::Record)
                        .default_with(Value::empty_record)
                        .composite([
                            "paddingleft",
                            "paddingtop",
                            "paddingright",
                            "paddingbottom",
                            "marginleft",
                            "margintop",
                            "marginright",
                            "marginbottom",
                        ])
                        .tooltip("margin and padding properties")
                        .editor("<box-editor></box-editor>"),
                )
                .property(Property::builder("style").artificial(true).render_with(render_style))
                .property(
                    Property::builder("font")
                        .ty(PropertyType::Record)
                        .default_with(Value::empty_record)
                        .composite(["weight", "size", "family", "align", "style", "color"])
                        .tooltip("font properties")
                        .editor("<font-editor></font-editor>"),
                ),
        )
        .register(
            UIComponent::builder("body")
                .template("<div>$#children$</div>")
                .label("Body")
                .icon("th")
                .group("Container"),
        )
        .register(
            UIComponent::builder("label")
                .template("<label $r:attributes$ $r:for?=for$ $style$>${value}$</label>")
                .label("Label")
                .icon("font")
                .inherits(["base", "style"])
                .group("Widgets")
                .valid_parents(TEXT_PARENTS)
                .property(Property::builder("for").tooltip("the corresponding input field"))
                .property(text_binding("value").tooltip("the label content")),
        );

    for level in 1..=5 {
        builder = builder.register(heading(level));
    }

    builder
        .register(
            UIComponent::builder("br")
                .template("<br $r:attributes$>")
                .label("Br")
                .icon("font")
                .inherits(["base"])
                .group("Widgets")
                .valid_parents(TEXT_PARENTS),
        )
        .register(
            UIComponent::builder("p")
                .template("<p $r:attributes$ $style$>${value}$</p>")
                .label("Paragraph")
                .icon("font")
                .inherits(["base", "style"])
                .group("Widgets")
                .valid_parents(TEXT_PARENTS)
                .property(text_binding("value").tooltip("the text value")),
        )
        .register(
            UIComponent::builder("hr")
                .template("<hr $r:attributes$ />")
                .label("Line")
                .icon("font")
                .inherits(["base", "style"])
                .group("Widgets")
                .valid_parents(["col", "div", "form", "fieldset", "body"])
                .property(text_binding("value").tooltip("the text value")),
        )
        .register(
            UIComponent::builder("div")
                .template("<div $class?=class$ $r:attributes$>$#children$</div>")
                .label("Div")
                .icon("th")
                .inherits(["base"])
                .group("Container")
                .valid_parents(CONTAINER_PARENTS),
        )
        .register(
            UIComponent::builder("form")
                .template("<form $name?=name$ novalidate='' $class?=class$ $r:attributes$>$#children$</form>")
                .label("Form")
                .icon("th")
                .inherits(["base"])
                .group("Container")
                .valid_parents(CONTAINER_PARENTS),
        )
        .register(
            UIComponent::builder("fieldset")
                .template(r#"<fieldset class="group" $r:attributes$><legend>${value}$</legend>$#children$</fieldset>"#)
                .label("Fieldset")
                .icon("th")
                .inherits(["base"])
                .group("Container")
                .valid_parents(["body", "div", "col", "form"])
                .property(text_binding("value")),
        )
        .register(
            UIComponent::builder("checkbox")
                .template(r#"<div class="checkbox"><label><input type="checkbox" $name?=name$ $[(ngModel)]?=model$ $r:attributes$/>${label}$</label></div>"#)
                .label("Checkbox")
                .icon("th")
                .inherits(["base"])
                .group("Inputs")
                .valid_parents(CONTAINER_PARENTS)
                .property(text_binding("label").group("Advanced").tooltip("the label"))
                .property(Property::builder("model").group("Advanced")),
        )
        .register(
            UIComponent::builder("button")
                .run_template(r#"<button type="button" $(click)?=click$ class="btn $class$" $r:attributes$>${text}$</button>"#)
                .edit_template(r#"<button type="button" class="btn $class$">${text}$</button>"#)
                .label("Button")
                .icon("th")
                .inherits(["base"])
                .group("Inputs")
                .valid_parents(["div", "col"])
                .property(text_binding("text").tooltip("the button text"))
                .property(Property::builder("click").default_value("")),
        )
        .register(
            UIComponent::builder("radio-button")
                .template(r#"<div class="radio"><label><input type="radio" $name?=name$ $value?=value$ $[(ngModel)]?=model$ $r:attributes$/>${label}$</label></div>"#)
                .label("Radio")
                .icon("th")
                .inherits(["base"])
                .group("Inputs")
                .valid_parents(CONTAINER_PARENTS)
                .property(
                    text_binding("label")
                        .group("Advanced")
                        .tooltip("the radio button label"),
                )
                .property(Property::builder("value"))
                .property(Property::builder("model").group("Advanced").tooltip("the model binding")),
        )
        .register(input())
        .register(
            UIComponent::builder("textarea")
                .template(r#"<textarea class="form-control" $name?=name$ $rows?=rows$ $maxlength?=max-length$ $placeholder?=placeholder$ $[(ngModel)]?=model$ $r:[required]=required$ $r:[disabled]=disabled$ $e:"disabled"$ $r:attributes$></textarea>"#)
                .label("Text")
                .icon("th")
                .inherits(["base", "style"])
                .group("Widgets")
                .valid_parents(["col"])
                .property(text_binding("placeholder"))
                .property(Property::builder("rows").ty(PropertyType::Number).default_value(2))
                .property(Property::builder("max-length").ty(PropertyType::Number))
                .property(flag_binding("required"))
                .property(flag_binding("disabled"))
                .property(Property::builder("model").default_value("").group("Advanced"))
                .property(text_binding("label").group("Advanced"))
                .property(Property::builder("value")),
        )
        .register(
            UIComponent::builder("select-box")
                .template(r#"<select class="form-control" $name?=name$ $r:[(ngModel)]?=model$ $r:[required]=required$ $r:[disabled]=disabled$ $e:"disabled"$ $r:attributes$><option value="">$emptyOption$</option><option *ngFor="let value of $options$" [ngValue]="value">{{value}}</option></select>"#)
                .label("Combo")
                .icon("th")
                .inherits(["base", "style"])
                .group("Widgets")
                .valid_parents(["col"])
                .property(flag_binding("required"))
                .property(flag_binding("disabled"))
                .property(Property::builder("model").default_value(""))
                .property(Property::builder("options").default_value(""))
                .property(text_binding("emptyOption")),
        )
        .register(
            UIComponent::builder("row")
                .template("<div class='row'>$#children$</div>")
                .label("Row")
                .icon("option-horizontal")
                .inherits(["base"])
                .group("Layout")
                .orientation(Orientation::Vertical)
                .valid_parents(["body", "col", "fieldset", "div", "form"])
                .decorator(decorate_row),
        )
        .register(
            UIComponent::builder("col")
                .template("<div class='col col-md-$columns$ col-md-offset-$offset$'>$#children$</div>")
                .label("Column")
                .icon("option-vertical")
                .inherits(["base"])
                .group("Layout")
                .valid_parents(["row"])
                .property(Property::builder("columns").ty(PropertyType::Number).default_value(2))
                .property(Property::builder("offset").ty(PropertyType::Number).default_value(0))
                .decorator(decorate_col),
        )
}

fn input() -> ComponentBuilder {
    let mut input = UIComponent::builder("input")
        .template(r#"<input $name?=name$ $type?=type$ $placeholder?=placeholder$ $[(ngModel)]?=model$ $r:[required]=required$ $r:[disabled]=disabled$ $e:"disabled"$ $class?=class$ $r:attributes$/>"#)
        .label("Input")
        .icon("th")
        .inherits(["base"])
        .group("Inputs")
        .valid_parents(["col", "div"])
        .property(flag_binding("required").tooltip("the required property"))
        .property(text_binding("placeholder").tooltip("the placeholder text"));
    if let Some(kinds) = TypeDescriptor::string_enum(["text", "number"]) {
        input = input.property(
            Property::builder("type")
                .ty(kinds)
                .tooltip("the input type ( text or number )"),
        );
    }
    input
        .property(flag_binding("disabled").tooltip("the disabled property"))
        .property(Property::builder("model").group("Advanced"))
}

/// The standard catalog, set up with the default template configuration.
pub fn standard() -> Result<ComponentRegistry, RegistryError> {
    builder().build()
}
