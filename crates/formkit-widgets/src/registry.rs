#![forbid(unsafe_code)]

//! The component registry.
//!
//! [`RegistryBuilder`] collects component declarations and, in
//! [`build`](RegistryBuilder::build), performs the one-time setup of every
//! component: inheritance resolution (parents' effective properties first, in
//! declared order, then own properties), cycle detection, property uniqueness
//! checks and template compilation. The resulting [`ComponentRegistry`] is
//! immutable and meant to be shared (`Arc<ComponentRegistry>`).

use std::sync::Arc;

use formkit_core::model::{ModelTree, NodeId, Properties};
use formkit_core::property::Property;
use formkit_template::{CompiledTemplate, RenderHost, RenderMode, TemplateConfig};
use rustc_hash::FxHashMap;

use crate::component::{CompiledTemplates, ComponentBuilder, UIComponent};
use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects component declarations.
#[derive(Debug, Default)]
#[must_use]
pub struct RegistryBuilder {
    components: Vec<ComponentBuilder>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, component: ComponentBuilder) -> Self {
        self.components.push(component);
        self
    }

    /// Set up every component with the default [`TemplateConfig`].
    pub fn build(self) -> Result<ComponentRegistry, RegistryError> {
        self.build_with(&TemplateConfig::default())
    }

    /// Set up every component, compiling templates with `config`.
    ///
    /// Fails before touching any component when `config` does not validate.
    pub fn build_with(self, config: &TemplateConfig) -> Result<ComponentRegistry, RegistryError> {
        config
            .validate()
            .map_err(|errors| RegistryError::InvalidConfig { errors })?;

        let mut components: Vec<UIComponent> = self
            .components
            .into_iter()
            .map(ComponentBuilder::into_component)
            .collect();

        let mut index = FxHashMap::default();
        for (i, component) in components.iter().enumerate() {
            if index.insert(component.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateComponent {
                    id: component.id.clone(),
                });
            }
        }

        let mut state = vec![Visit::Pending; components.len()];
        let mut stack = Vec::new();
        for i in 0..components.len() {
            resolve(i, &mut components, &index, &mut state, &mut stack)?;
        }

        let config = Arc::new(config.clone());
        for component in &mut components {
            component.config = Arc::clone(&config);
            compile_templates(component, &config)?;
        }

        tracing::debug!(components = components.len(), "component registry ready");
        Ok(ComponentRegistry {
            components,
            index,
            config,
        })
    }
}

/// Depth-first inheritance resolution. `stack` holds the ids being resolved.
fn resolve(
    i: usize,
    components: &mut [UIComponent],
    index: &FxHashMap<String, usize>,
    state: &mut [Visit],
    stack: &mut Vec<String>,
) -> Result<(), RegistryError> {
    match state[i] {
        Visit::Done => return Ok(()),
        Visit::InProgress => {
            let start = stack
                .iter()
                .position(|id| *id == components[i].id)
                .unwrap_or(0);
            let mut chain = stack[start..].to_vec();
            chain.push(components[i].id.clone());
            return Err(RegistryError::CyclicInheritance { chain });
        }
        Visit::Pending => {}
    }
    state[i] = Visit::InProgress;
    stack.push(components[i].id.clone());

    let mut effective: Vec<Arc<Property>> = Vec::new();
    for parent in components[i].inherits.clone() {
        let Some(&p) = index.get(&parent) else {
            return Err(RegistryError::UnknownParent {
                component: components[i].id.clone(),
                parent,
            });
        };
        resolve(p, components, index, state, stack)?;
        effective.extend(components[p].properties.iter().cloned());
    }
    effective.extend(components[i].own.iter().cloned());

    let component = &mut components[i];
    component.properties.clear();
    component.index.clear();
    for property in effective {
        if let Some(&existing) = component.index.get(property.name()) {
            if Arc::ptr_eq(&component.properties[existing], &property) {
                continue;
            }
            return Err(RegistryError::DuplicateProperty {
                component: component.id.clone(),
                property: property.name().to_string(),
            });
        }
        component
            .index
            .insert(property.name().to_string(), component.properties.len());
        component.properties.push(property);
    }
    tracing::trace!(
        component = %component.id,
        properties = component.properties.len(),
        "inheritance resolved"
    );

    stack.pop();
    state[i] = Visit::Done;
    Ok(())
}

/// Compile both modes. A component declaring a template for only one mode
/// uses that source for the other mode too.
fn compile_templates(component: &mut UIComponent, config: &TemplateConfig) -> Result<(), RegistryError> {
    let (edit, run) = match (&component.sources.edit, &component.sources.run) {
        (None, None) => return Ok(()),
        (Some(edit), Some(run)) => (edit, run),
        (Some(only), None) | (None, Some(only)) => {
            tracing::trace!(component = %component.id, "one template shared by both modes");
            (only, only)
        }
    };
    let compile = |source: &str, mode: RenderMode| {
        CompiledTemplate::compile(source, mode, &*component, config).map_err(|source| {
            RegistryError::Template {
                component: component.id.clone(),
                mode,
                source,
            }
        })
    };
    let edit = compile(edit, RenderMode::Edit)?;
    let run = compile(run, RenderMode::Run)?;
    component.compiled = Some(CompiledTemplates { edit, run });
    Ok(())
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Components of one palette category, in registration order.
#[derive(Debug)]
pub struct PaletteGroup<'a> {
    pub name: &'a str,
    pub components: Vec<&'a UIComponent>,
}

/// Immutable catalog of set-up components.
#[derive(Debug)]
pub struct ComponentRegistry {
    components: Vec<UIComponent>,
    index: FxHashMap<String, usize>,
    config: Arc<TemplateConfig>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&UIComponent> {
        self.index.get(id).map(|&i| &self.components[i])
    }

    /// Like [`find`](Self::find), failing loudly on unknown ids.
    pub fn component(&self, id: &str) -> Result<&UIComponent, RegistryError> {
        self.find(id).ok_or_else(|| RegistryError::UnknownComponent { id: id.to_string() })
    }

    /// All components in registration order.
    pub fn components(&self) -> impl Iterator<Item = &UIComponent> + '_ {
        self.components.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Concrete components grouped by palette category, groups in first-seen
    /// order. Components without a group are listed under `""`.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteGroup<'_>> {
        let mut groups: Vec<PaletteGroup<'_>> = Vec::new();
        for component in self.components.iter().filter(|c| !c.is_abstract()) {
            let name = component.group().unwrap_or("");
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.components.push(component),
                None => groups.push(PaletteGroup {
                    name,
                    components: vec![component],
                }),
            }
        }
        groups
    }

    /// Render the node `id` with the component its id names.
    ///
    /// Unknown nodes and unknown component ids render as "".
    #[must_use]
    pub fn render(&self, tree: &ModelTree, id: NodeId, mode: RenderMode) -> String {
        let Some(node) = tree.get(id) else {
            tracing::warn!(node = %id, "render of unknown node");
            return String::new();
        };
        let Some(component) = self.find(node.component_id()) else {
            tracing::warn!(node = %id, component = node.component_id(), "render of unknown component");
            return String::new();
        };
        component.render(tree, id, mode, self)
    }
}

impl RenderHost for ComponentRegistry {
    fn render_node(&self, tree: &ModelTree, id: NodeId, mode: RenderMode) -> String {
        self.render(tree, id, mode)
    }
}
