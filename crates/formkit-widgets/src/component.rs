#![forbid(unsafe_code)]

//! Component descriptors.
//!
//! A [`UIComponent`] is the catalog entry for one component kind: palette
//! metadata, the effective property list (own properties plus everything
//! inherited), nesting rules, and the compiled edit/run templates.
//!
//! Components are declared with [`ComponentBuilder`] and become usable once a
//! [`RegistryBuilder`](crate::registry::RegistryBuilder) has resolved their
//! inheritance and compiled their templates.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use formkit_core::document::NodeDocument;
use formkit_core::model::{ModelNode, ModelTree, NodeId, Properties, PropertiesMut};
use formkit_core::property::Property;
use formkit_core::value::{BindingKind, Value};
use formkit_template::{CompiledTemplate, PropertyLookup, RenderHost, RenderMode, RenderScope, TemplateConfig};
use rustc_hash::FxHashMap;

use crate::error::RegistryError;

/// Post-render hook. Receives the rendered node and an opaque host-specific
/// target (a DOM element, a [`GridCells`](crate::catalog::GridCells), ...).
pub type DecorateFn = Arc<dyn Fn(&ModelTree, NodeId, &mut dyn Any) + Send + Sync>;

/// Layout hint for containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A named group of user-facing properties, as shown by a property editor.
#[derive(Debug, Clone)]
pub struct PropertyGroup {
    pub name: String,
    pub properties: Vec<Arc<Property>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TemplateSources {
    pub(crate) edit: Option<String>,
    pub(crate) run: Option<String>,
}

#[derive(Debug)]
pub(crate) struct CompiledTemplates {
    pub(crate) edit: CompiledTemplate,
    pub(crate) run: CompiledTemplate,
}

// ---------------------------------------------------------------------------
// UIComponent
// ---------------------------------------------------------------------------

/// Catalog entry for one component kind.
pub struct UIComponent {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) icon: Option<String>,
    pub(crate) group: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) inherits: Vec<String>,
    pub(crate) valid_parents: Vec<String>,
    pub(crate) orientation: Option<Orientation>,
    pub(crate) decorator: Option<DecorateFn>,
    pub(crate) own: Vec<Arc<Property>>,
    pub(crate) sources: TemplateSources,
    // Filled in by the registry builder.
    pub(crate) properties: Vec<Arc<Property>>,
    pub(crate) index: FxHashMap<String, usize>,
    pub(crate) compiled: Option<CompiledTemplates>,
    pub(crate) config: Arc<TemplateConfig>,
}

impl fmt::Debug for UIComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UIComponent")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("abstract", &self.is_abstract)
            .field("inherits", &self.inherits)
            .field(
                "properties",
                &self.properties.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("template", &self.compiled.is_some())
            .finish_non_exhaustive()
    }
}

impl UIComponent {
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(id)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Palette category.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Abstract components only contribute properties to their heirs.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[must_use]
    pub fn inherits(&self) -> &[String] {
        &self.inherits
    }

    #[must_use]
    pub fn valid_parents(&self) -> &[String] {
        &self.valid_parents
    }

    #[must_use]
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    #[must_use]
    pub fn is_template(&self) -> bool {
        self.compiled.is_some()
    }

    #[must_use]
    pub fn template(&self, mode: RenderMode) -> Option<&CompiledTemplate> {
        self.compiled.as_ref().map(|c| match mode {
            RenderMode::Edit => &c.edit,
            RenderMode::Run => &c.run,
        })
    }

    // --- properties --------------------------------------------------------

    /// Effective properties: inherited ones first, in declared order, then own.
    #[must_use]
    pub fn properties(&self) -> &[Arc<Property>] {
        &self.properties
    }

    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&Arc<Property>> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Like [`find_property`](Self::find_property), failing loudly on unknown names.
    pub fn property(&self, name: &str) -> Result<&Arc<Property>, RegistryError> {
        self.find_property(name)
            .ok_or_else(|| RegistryError::UnknownProperty {
                component: self.id.clone(),
                property: name.to_string(),
            })
    }

    /// User-facing properties grouped by their group label, artificial ones
    /// excluded, groups in first-seen order.
    #[must_use]
    pub fn property_groups(&self) -> Vec<PropertyGroup> {
        let mut groups: Vec<PropertyGroup> = Vec::new();
        for property in self.properties.iter().filter(|p| !p.is_artificial()) {
            match groups.iter_mut().find(|g| g.name == property.group()) {
                Some(group) => group.properties.push(Arc::clone(property)),
                None => groups.push(PropertyGroup {
                    name: property.group().to_string(),
                    properties: vec![Arc::clone(property)],
                }),
            }
        }
        groups
    }

    // --- defaults ----------------------------------------------------------

    /// A fresh node document with an empty child list and every default filled in.
    #[must_use]
    pub fn create_default(&self) -> NodeDocument {
        let mut document = NodeDocument::new(self.id.clone());
        document.children = Some(Vec::new());
        self.add_defaults(&mut document);
        document
    }

    /// Fill every missing (or null) field that has a default. Existing fields
    /// are left alone.
    pub fn add_defaults<P: PropertiesMut + ?Sized>(&self, node: &mut P) {
        for property in &self.properties {
            if node.value(property.name()).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(default) = property.create_default() {
                node.set_value(property.name(), default);
            }
        }
    }

    /// Remove an empty child list and every field equal to its default.
    pub fn delete_defaults<P: PropertiesMut + ?Sized>(&self, node: &mut P) {
        node.clear_empty_children();
        for property in &self.properties {
            let Some(current) = node.value(property.name()) else {
                continue;
            };
            let default = property.create_default();
            if property.compare(Some(current), default.as_ref(), property.name(), &mut Vec::new()) {
                node.remove_value(property.name());
            }
        }
    }

    /// Whether a node of this kind may be nested inside a `parent_id` node.
    #[must_use]
    pub fn is_valid_parent(&self, parent_id: &str) -> bool {
        self.valid_parents.iter().any(|p| p == parent_id)
    }

    // --- rendering ---------------------------------------------------------

    /// Stored value or default, passed through the property's render hook.
    #[must_use]
    pub fn render_property(&self, node: &ModelNode, property: &Property) -> String {
        property.render(node)
    }

    /// Display string for a property as exposed to the rendering host:
    /// literals as markup, expressions wrapped in interpolation markers.
    pub fn display_property(&self, node: &ModelNode, name: &str) -> Result<String, RegistryError> {
        let property = self.property(name)?;
        let value = property.value_of(node);
        if !property.allows_binding() {
            return Ok(value.map(Value::to_markup).unwrap_or_default());
        }
        Ok(match value.and_then(Value::as_binding) {
            Some(binding) if binding.kind == BindingKind::Binding => {
                self.config.interpolate(&binding.inner().to_markup())
            }
            Some(binding) => binding.inner().to_markup(),
            None => value.map(Value::to_markup).unwrap_or_default(),
        })
    }

    /// Render a node of this kind. Components without a template render as "".
    #[must_use]
    pub fn render(&self, tree: &ModelTree, id: NodeId, mode: RenderMode, host: &dyn RenderHost) -> String {
        let Some(template) = self.template(mode) else {
            return String::new();
        };
        match RenderScope::new(tree, id, host) {
            Some(scope) => template.render(&scope),
            None => String::new(),
        }
    }

    /// Invoke the decorator hook, if any.
    pub fn decorate(&self, tree: &ModelTree, id: NodeId, target: &mut dyn Any) {
        if let Some(decorator) = &self.decorator {
            decorator(tree, id, target);
        }
    }
}

impl PropertyLookup for UIComponent {
    fn lookup_property(&self, name: &str) -> Option<Arc<Property>> {
        self.find_property(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent, consuming declaration of a component kind.
#[must_use]
pub struct ComponentBuilder {
    component: UIComponent,
}

impl fmt::Debug for ComponentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentBuilder").field(&self.component.id).finish()
    }
}

impl ComponentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            component: UIComponent {
                label: id.clone(),
                id,
                icon: None,
                group: None,
                is_abstract: false,
                inherits: Vec::new(),
                valid_parents: Vec::new(),
                orientation: None,
                decorator: None,
                own: Vec::new(),
                sources: TemplateSources::default(),
                properties: Vec::new(),
                index: FxHashMap::default(),
                compiled: None,
                config: Arc::default(),
            },
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.component.label = label.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.component.icon = Some(icon.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.component.group = Some(group.into());
        self
    }

    pub fn abstract_kind(mut self) -> Self {
        self.component.is_abstract = true;
        self
    }

    pub fn inherits<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component.inherits = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn valid_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component.valid_parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.component.orientation = Some(orientation);
        self
    }

    pub fn decorator(
        mut self,
        decorator: impl Fn(&ModelTree, NodeId, &mut dyn Any) + Send + Sync + 'static,
    ) -> Self {
        self.component.decorator = Some(Arc::new(decorator));
        self
    }

    /// Use `source` for both edit and run rendering.
    pub fn template(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        self.component.sources.edit = Some(source.clone());
        self.component.sources.run = Some(source);
        self
    }

    /// Override the edit-mode template. Without a run template this source
    /// serves both modes.
    pub fn edit_template(mut self, source: impl Into<String>) -> Self {
        self.component.sources.edit = Some(source.into());
        self
    }

    /// Override the run-mode template. Without an edit template this source
    /// serves both modes.
    pub fn run_template(mut self, source: impl Into<String>) -> Self {
        self.component.sources.run = Some(source.into());
        self
    }

    /// Declare an own property.
    pub fn property(mut self, property: impl Into<Arc<Property>>) -> Self {
        self.component.own.push(property.into());
        self
    }

    pub(crate) fn into_component(self) -> UIComponent {
        self.component
    }
}
