#![forbid(unsafe_code)]

//! Property descriptors.
//!
//! A [`Property`] describes one settable field of a component kind: its type,
//! default, whether it can hold a [`Binding`], an optional composite field list
//! and an optional render hook. Properties are built once with
//! [`PropertyBuilder`] and shared as `Arc<Property>` between the components that
//! inherit them.
//!
//! # Example
//! ```
//! use formkit_core::property::{Property, PropertyType};
//! use formkit_core::value::{Binding, Value};
//!
//! let label = Property::builder("value")
//!     .ty(PropertyType::String)
//!     .binding(true)
//!     .build();
//!
//! assert_eq!(label.create_default(), Some(Value::Binding(Binding::literal(""))));
//! assert!(label.compare(None, label.create_default().as_ref(), "value", &mut Vec::new()));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::compare::{Difference, deep_compare};
use crate::model::{ModelNode, Properties};
use crate::types::TypeDescriptor;
use crate::value::{Binding, BindingKind, Value};

/// Default palette group of a property.
pub const DEFAULT_GROUP: &str = "main";

/// Custom markup conversion for a property value.
pub type RenderFn = Arc<dyn Fn(&ModelNode, &Value) -> String + Send + Sync>;

/// Zero-argument default factory.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

// ---------------------------------------------------------------------------
// PropertyType
// ---------------------------------------------------------------------------

/// Declared type of a property: a primitive name or a full descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    /// A composite record of named sub-fields.
    Record,
    List,
    /// No declared type.
    #[default]
    Any,
    Described(TypeDescriptor),
}

impl PropertyType {
    /// The synthesised default when no explicit default is configured.
    ///
    /// Enumerations default to their whole value list.
    #[must_use]
    pub fn synthesized_default(&self) -> Option<Value> {
        match self {
            Self::String => Some(Value::from("")),
            Self::Number => Some(Value::from(0)),
            Self::Described(d) => match d.values() {
                Some(values) => Some(Value::List(values.to_vec())),
                None => Self::from(d.base()).synthesized_default(),
            },
            Self::Boolean | Self::Record | Self::List | Self::Any => None,
        }
    }

    /// Whether a literal (non-binding) value fits this type. `Null` always fits.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Record, Value::Record(_))
            | (Self::List, Value::List(_)) => true,
            (Self::Described(d), Value::List(items)) => d.values() == Some(items.as_slice()),
            (Self::Described(d), v) => d.validate(v),
            _ => false,
        }
    }
}

impl From<crate::types::PrimitiveType> for PropertyType {
    fn from(base: crate::types::PrimitiveType) -> Self {
        match base {
            crate::types::PrimitiveType::String => Self::String,
            crate::types::PrimitiveType::Number => Self::Number,
            crate::types::PrimitiveType::Boolean => Self::Boolean,
        }
    }
}

impl From<TypeDescriptor> for PropertyType {
    fn from(d: TypeDescriptor) -> Self {
        Self::Described(d)
    }
}

// ---------------------------------------------------------------------------
// DefaultValue
// ---------------------------------------------------------------------------

/// Explicitly configured default of a property.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Factory(DefaultFactory),
}

impl DefaultValue {
    #[must_use]
    pub fn produce(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// One settable field of a component kind.
#[derive(Clone)]
pub struct Property {
    name: String,
    group: String,
    ty: PropertyType,
    allow_binding: bool,
    artificial: bool,
    composite: Option<Vec<String>>,
    default: Option<DefaultValue>,
    render: Option<RenderFn>,
    tooltip: Option<String>,
    editor_template: Option<String>,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("ty", &self.ty)
            .field("allow_binding", &self.allow_binding)
            .field("artificial", &self.artificial)
            .field("composite", &self.composite)
            .field("default", &self.default)
            .field("render", &self.render.is_some())
            .finish_non_exhaustive()
    }
}

impl Property {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PropertyBuilder {
        PropertyBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn ty(&self) -> &PropertyType {
        &self.ty
    }

    #[must_use]
    pub fn allows_binding(&self) -> bool {
        self.allow_binding
    }

    /// Artificial properties are hidden from the property editor.
    #[must_use]
    pub fn is_artificial(&self) -> bool {
        self.artificial
    }

    #[must_use]
    pub fn composite_fields(&self) -> Option<&[String]> {
        self.composite.as_deref()
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    #[must_use]
    pub fn editor_template(&self) -> Option<&str> {
        self.editor_template.as_deref()
    }

    #[must_use]
    pub fn has_render_fn(&self) -> bool {
        self.render.is_some()
    }

    /// Default value of this property; `None` means "left unset".
    ///
    /// Binding-capable properties always return a `{kind: value}` wrapper.
    #[must_use]
    pub fn create_default(&self) -> Option<Value> {
        let value = match &self.default {
            Some(default) => Some(default.produce()),
            None => self.ty.synthesized_default(),
        };
        if self.allow_binding {
            Some(Value::Binding(Binding::literal(value.unwrap_or_default())))
        } else {
            value
        }
    }

    /// Independent copy of a stored value.
    #[must_use]
    pub fn copy_value(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Raw field read from a node, without defaulting.
    #[must_use]
    pub fn value_of<'a, P: Properties + ?Sized>(&self, node: &'a P) -> Option<&'a Value> {
        node.value(&self.name)
    }

    /// Compare two stored values after defaulting missing sides.
    ///
    /// Returns `true` when this call recorded no differences.
    pub fn compare(
        &self,
        left: Option<&Value>,
        right: Option<&Value>,
        path: &str,
        diffs: &mut Vec<Difference>,
    ) -> bool {
        let default = self.create_default();
        let left = self.defaulted(left, default.as_ref());
        let right = self.defaulted(right, default.as_ref());
        deep_compare(left.as_ref(), right.as_ref(), path, diffs)
    }

    fn defaulted(&self, value: Option<&Value>, default: Option<&Value>) -> Option<Value> {
        match value {
            None | Some(Value::Null) => default.cloned(),
            Some(Value::Binding(b)) if self.allow_binding && b.value.is_null() => {
                let inner = default
                    .and_then(Value::as_binding)
                    .map(|d| (*d.value).clone())
                    .unwrap_or_default();
                Some(Value::Binding(Binding {
                    kind: b.kind,
                    value: Box::new(inner),
                }))
            }
            Some(v) => Some(v.clone()),
        }
    }

    /// Whether `value` may be stored in this property.
    ///
    /// Binding-capable properties require a binding wrapper whose expression is
    /// a string or whose literal fits the declared type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.allow_binding {
            return self.ty.accepts(value);
        }
        match value {
            Value::Binding(b) => match b.kind {
                BindingKind::Binding => matches!(*b.value, Value::String(_)),
                BindingKind::Value => self.ty.accepts(&b.value),
            },
            _ => false,
        }
    }

    /// Markup for this property's value on `node`: the stored value or the
    /// default, passed through the render hook when one is configured.
    #[must_use]
    pub fn render(&self, node: &ModelNode) -> String {
        let stored = node.value(&self.name).filter(|v| !v.is_null());
        let value = match stored {
            Some(v) => Some(v.clone()),
            None => self.create_default(),
        };
        self.render_value(node, value.as_ref())
    }

    /// Apply the render hook (or the plain markup conversion) to a value.
    #[must_use]
    pub fn render_value(&self, node: &ModelNode, value: Option<&Value>) -> String {
        match (&self.render, value) {
            (Some(render), Some(v)) => render(node, v),
            (Some(render), None) => render(node, &Value::Null),
            (None, Some(v)) => v.to_markup(),
            (None, None) => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent, consuming builder for [`Property`].
#[derive(Debug, Clone)]
#[must_use]
pub struct PropertyBuilder {
    property: Property,
}

impl PropertyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            property: Property {
                name: name.into(),
                group: DEFAULT_GROUP.to_string(),
                ty: PropertyType::Any,
                allow_binding: false,
                artificial: false,
                composite: None,
                default: None,
                render: None,
                tooltip: None,
                editor_template: None,
            },
        }
    }

    pub fn ty(mut self, ty: impl Into<PropertyType>) -> Self {
        self.property.ty = ty.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.property.group = group.into();
        self
    }

    pub fn binding(mut self, allow: bool) -> Self {
        self.property.allow_binding = allow;
        self
    }

    pub fn artificial(mut self, artificial: bool) -> Self {
        self.property.artificial = artificial;
        self
    }

    /// Mark the property as a composite record of the given sub-fields.
    pub fn composite<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property.composite = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.property.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.property.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    pub fn render_with(
        mut self,
        render: impl Fn(&ModelNode, &Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.property.render = Some(Arc::new(render));
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.property.tooltip = Some(tooltip.into());
        self
    }

    pub fn editor(mut self, template: impl Into<String>) -> Self {
        self.property.editor_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Property {
        self.property
    }

    /// Build into the shared form used by component descriptors.
    #[must_use]
    pub fn shared(self) -> Arc<Property> {
        Arc::new(self.property)
    }
}

impl From<PropertyBuilder> for Arc<Property> {
    fn from(builder: PropertyBuilder) -> Self {
        builder.shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertiesMut;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn synthesized_defaults_follow_type() {
        let s = Property::builder("s").ty(PropertyType::String).build();
        let n = Property::builder("n").ty(PropertyType::Number).build();
        let b = Property::builder("b").ty(PropertyType::Boolean).build();
        assert_eq!(s.create_default(), Some(Value::from("")));
        assert_eq!(n.create_default(), Some(Value::from(0)));
        assert_eq!(b.create_default(), None);
    }

    #[test]
    fn enum_defaults_to_whole_value_list() {
        let ty = TypeDescriptor::string_enum(["text", "number"]).unwrap();
        let p = Property::builder("type").ty(ty).build();
        assert_eq!(
            p.create_default(),
            Some(Value::List(vec![Value::from("text"), Value::from("number")]))
        );
    }

    #[test]
    fn factory_default_is_invoked_each_time() {
        let p = Property::builder("box")
            .default_with(Value::empty_record)
            .build();
        assert_eq!(p.create_default(), Some(Value::empty_record()));
    }

    #[test]
    fn binding_default_wraps_even_undefined() {
        let p = Property::builder("click").binding(true).build();
        assert_eq!(p.create_default(), Some(Value::Binding(Binding::literal(Value::Null))));
    }

    // =========================================================================
    // Compare
    // =========================================================================

    #[test]
    fn absent_equals_default() {
        let p = Property::builder("rows").ty(PropertyType::Number).default_value(2).build();
        let mut diffs = Vec::new();
        assert!(p.compare(None, Some(&Value::from(2)), "rows", &mut diffs));
        assert!(!p.compare(None, Some(&Value::from(3)), "rows", &mut diffs));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "rows");
    }

    #[test]
    fn binding_with_null_inner_defaults_inner() {
        let p = Property::builder("value").ty(PropertyType::String).binding(true).build();
        let empty = Value::Binding(Binding::literal(Value::Null));
        let blank = Value::Binding(Binding::literal(""));
        assert!(p.compare(Some(&empty), Some(&blank), "value", &mut Vec::new()));
    }

    #[test]
    fn binding_kind_change_is_a_difference() {
        let p = Property::builder("value").ty(PropertyType::String).binding(true).build();
        let literal = Value::Binding(Binding::literal("x"));
        let bound = Value::Binding(Binding::expression("x"));
        assert!(!p.compare(Some(&literal), Some(&bound), "value", &mut Vec::new()));
    }

    // =========================================================================
    // Accepts
    // =========================================================================

    #[test]
    fn binding_property_requires_wrapper() {
        let p = Property::builder("required").ty(PropertyType::Boolean).binding(true).build();
        assert!(!p.accepts(&Value::from(true)));
        assert!(p.accepts(&Value::Binding(Binding::literal(true))));
        assert!(!p.accepts(&Value::Binding(Binding::literal("yes"))));
        assert!(p.accepts(&Value::Binding(Binding::expression("form.required"))));
    }

    #[test]
    fn enum_accepts_member_and_whole_list() {
        let ty = TypeDescriptor::string_enum(["text", "number"]).unwrap();
        let p = Property::builder("type").ty(ty).build();
        assert!(p.accepts(&Value::from("text")));
        assert!(!p.accepts(&Value::from("date")));
        assert!(p.accepts(&p.create_default().unwrap()));
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn render_uses_default_and_hook() {
        let p = Property::builder("rows")
            .ty(PropertyType::Number)
            .default_value(2)
            .render_with(|_, v| format!("[{}]", v.to_markup()))
            .build();
        let mut node = ModelNode::new("textarea");
        assert_eq!(p.render(&node), "[2]");
        node.set_value("rows", Value::from(5));
        assert_eq!(p.render(&node), "[5]");
    }

    #[test]
    fn render_without_value_or_default_is_empty() {
        let p = Property::builder("click").build();
        assert_eq!(p.render(&ModelNode::new("button")), "");
    }

    #[test]
    fn builder_sets_metadata() {
        let p = Property::builder("font")
            .group("Style")
            .composite(["weight", "size"])
            .artificial(true)
            .tooltip("Font settings")
            .editor("<font-editor>")
            .build();
        assert_eq!(p.group(), "Style");
        assert_eq!(p.composite_fields().map(<[String]>::len), Some(2));
        assert!(p.is_artificial());
        assert_eq!(p.tooltip(), Some("Font settings"));
        assert_eq!(p.editor_template(), Some("<font-editor>"));
        assert_eq!(Property::builder("x").build().group(), DEFAULT_GROUP);
    }
}
