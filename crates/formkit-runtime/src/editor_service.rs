#![forbid(unsafe_code)]

//! Tree-wide operations driven by the component registry.
//!
//! [`EditorService`] uses each node's component descriptor as its schema:
//! comparing nodes, copying their declared properties, producing minimal
//! documents for persistence, and filling defaults back in after a load.
//! Properties whose names start with `$` are internal bookkeeping and never
//! compared or copied.

use std::fmt;
use std::sync::Arc;

use formkit_core::compare::Difference;
use formkit_core::document::NodeDocument;
use formkit_core::model::{ModelTree, NodeId, Properties, PropertiesMut, TreeError};
use formkit_core::value::Value;
use formkit_widgets::{ComponentRegistry, RegistryError, UIComponent};

/// Errors from editor operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Tree(TreeError),
    Registry(RegistryError),
    /// The value does not satisfy the property's type or binding contract.
    Rejected {
        component: String,
        property: String,
        value: Value,
    },
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "tree error: {e}"),
            Self::Registry(e) => write!(f, "registry error: {e}"),
            Self::Rejected {
                component,
                property,
                value,
            } => write!(
                f,
                "value {value} rejected by property '{property}' of component '{component}'"
            ),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<TreeError> for EditorError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<RegistryError> for EditorError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

fn is_internal(name: &str) -> bool {
    name.starts_with('$')
}

/// Registry-backed operations over model trees and documents.
#[derive(Debug, Clone)]
pub struct EditorService {
    registry: Arc<ComponentRegistry>,
}

impl EditorService {
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn component_of<P: Properties + ?Sized>(&self, node: &P) -> Result<&UIComponent, EditorError> {
        Ok(self.registry.component(node.component_id())?)
    }

    /// Every differing declared property of `a` and `b`, using `a`'s
    /// component as the schema for both.
    pub fn differences<A, B>(&self, a: &A, b: &B) -> Result<Vec<Difference>, EditorError>
    where
        A: Properties + ?Sized,
        B: Properties + ?Sized,
    {
        let component = self.component_of(a)?;
        let mut diffs = Vec::new();
        for property in component.properties().iter().filter(|p| !is_internal(p.name())) {
            property.compare(
                property.value_of(a),
                property.value_of(b),
                property.name(),
                &mut diffs,
            );
        }
        Ok(diffs)
    }

    /// Whether any declared property of `a` and `b` differs.
    pub fn diff<A, B>(&self, a: &A, b: &B) -> Result<bool, EditorError>
    where
        A: Properties + ?Sized,
        B: Properties + ?Sized,
    {
        Ok(!self.differences(a, b)?.is_empty())
    }

    /// Copy every declared property of `source` onto `target`. Properties
    /// missing on `source` are removed from `target`.
    pub fn copy_properties<S, T>(&self, source: &S, target: &mut T) -> Result<(), EditorError>
    where
        S: Properties + ?Sized,
        T: PropertiesMut + ?Sized,
    {
        let component = self.component_of(source)?;
        for property in component.properties().iter().filter(|p| !is_internal(p.name())) {
            match property.value_of(source) {
                Some(value) => {
                    target.set_value(property.name(), property.copy_value(value));
                }
                None => {
                    target.remove_value(property.name());
                }
            }
        }
        Ok(())
    }

    /// Detached copy of `root`, with its subtree when `recursive`.
    pub fn copy_model(
        &self,
        tree: &ModelTree,
        root: NodeId,
        recursive: bool,
    ) -> Result<NodeDocument, EditorError> {
        let node = tree.node(root)?;
        let mut document = NodeDocument::new(node.component_id());
        self.copy_properties(node, &mut document)?;
        if recursive {
            if let Some(children) = node.children() {
                document.children = Some(
                    children
                        .iter()
                        .map(|&child| self.copy_model(tree, child, true))
                        .collect::<Result<_, _>>()?,
                );
            }
        }
        Ok(document)
    }

    /// Remove default-valued properties and empty child lists, recursively.
    pub fn strip_model(&self, document: &mut NodeDocument) -> Result<(), EditorError> {
        self.component_of(document)?.delete_defaults(document);
        for child in document.children.iter_mut().flatten() {
            self.strip_model(child)?;
        }
        Ok(())
    }

    /// Re-establish parent links and fill missing defaults below `root`.
    pub fn connect_model(&self, tree: &mut ModelTree, root: NodeId) -> Result<(), EditorError> {
        tree.relink(root)?;
        for id in tree.descendants(root) {
            let node = tree.node_mut(id)?;
            let component = self.registry.component(node.component_id())?;
            component.add_defaults(node);
        }
        Ok(())
    }

    /// Import `document` into `tree` as a detached subtree and connect it.
    ///
    /// Every component id is checked before anything is inserted.
    pub fn instantiate(
        &self,
        tree: &mut ModelTree,
        document: &NodeDocument,
    ) -> Result<NodeId, EditorError> {
        self.check_known(document)?;
        let root = tree.import(document);
        self.connect_model(tree, root)?;
        tracing::debug!(root = %root, nodes = document.node_count(), "document instantiated");
        Ok(root)
    }

    fn check_known(&self, document: &NodeDocument) -> Result<(), EditorError> {
        self.component_of(document)?;
        for child in document.children.iter().flatten() {
            self.check_known(child)?;
        }
        Ok(())
    }

    /// Store `value` in property `name` of node `id` after checking it
    /// against the property's contract. Returns the previous value.
    pub fn set_property(
        &self,
        tree: &mut ModelTree,
        id: NodeId,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>, EditorError> {
        let node = tree.node_mut(id)?;
        let component = self.registry.component(node.component_id())?;
        let property = component.property(name)?;
        if !property.accepts(&value) {
            return Err(EditorError::Rejected {
                component: component.id().to_string(),
                property: name.to_string(),
                value,
            });
        }
        tracing::trace!(node = %id, property = name, "property set");
        Ok(node.set_value(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_core::model::ModelNode;
    use formkit_core::value::Binding;
    use formkit_widgets::catalog;

    fn service() -> EditorService {
        EditorService::new(Arc::new(catalog::standard().unwrap()))
    }

    fn form_tree() -> (ModelTree, NodeId, NodeId) {
        let mut tree = ModelTree::new();
        let form = tree.insert(ModelNode::container("form").with_value("name", "f"));
        let label = tree.insert(
            ModelNode::new("label")
                .with_value("value", Binding::literal("Name"))
                .with_value("$counter", 3),
        );
        tree.append_child(form, label).unwrap();
        (tree, form, label)
    }

    // =========================================================================
    // diff / copy
    // =========================================================================

    #[test]
    fn diff_uses_defaults_and_ignores_internal_fields() {
        let service = service();
        let a = ModelNode::new("label").with_value("$counter", 1);
        let b = ModelNode::new("label")
            .with_value("name", "")
            .with_value("value", Binding::literal(""))
            .with_value("$counter", 2);
        assert!(!service.diff(&a, &b).unwrap());

        let c = ModelNode::new("label").with_value("name", "x");
        let diffs = service.differences(&a, &c).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "name");
    }

    #[test]
    fn diff_of_unknown_component_is_an_error() {
        let service = service();
        let ghost = ModelNode::new("ghost");
        assert!(matches!(
            service.diff(&ghost, &ghost),
            Err(EditorError::Registry(RegistryError::UnknownComponent { .. }))
        ));
    }

    #[test]
    fn copy_properties_removes_missing_fields() {
        let service = service();
        let source = NodeDocument::new("label").with_value("name", "a");
        let mut target = ModelNode::new("label")
            .with_value("name", "b")
            .with_value("for", "email")
            .with_value("$counter", 9);
        service.copy_properties(&source, &mut target).unwrap();
        assert_eq!(target.value("name"), Some(&Value::from("a")));
        assert!(!target.has_value("for"));
        assert_eq!(target.value("$counter"), Some(&Value::from(9)));
    }

    #[test]
    fn copy_model_is_shallow_unless_recursive() {
        let service = service();
        let (tree, form, _) = form_tree();
        let shallow = service.copy_model(&tree, form, false).unwrap();
        assert_eq!(shallow.children, None);
        let deep = service.copy_model(&tree, form, true).unwrap();
        let children = deep.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].value("value"), Some(&Value::Binding(Binding::literal("Name"))));
        assert!(!children[0].has_value("$counter"));
    }

    // =========================================================================
    // strip / connect
    // =========================================================================

    #[test]
    fn strip_then_instantiate_round_trips() {
        let service = service();
        let (mut tree, form, _) = form_tree();
        service.connect_model(&mut tree, form).unwrap();

        let mut document = service.copy_model(&tree, form, true).unwrap();
        service.strip_model(&mut document).unwrap();
        assert_eq!(document.properties.len(), 1);
        let label = &document.children.as_ref().unwrap()[0];
        assert_eq!(label.properties.len(), 1);
        assert_eq!(label.children, None);

        let mut other = ModelTree::new();
        let copy = service.instantiate(&mut other, &document).unwrap();
        let copied_label = other.children(copy)[0];
        assert_eq!(other.parent(copied_label), Some(copy));
        assert!(!service.diff(&other[copied_label], &tree[tree.children(form)[0]]).unwrap());
        assert_eq!(other[copied_label].value("class"), Some(&Value::from("")));
    }

    #[test]
    fn instantiate_rejects_unknown_components_up_front() {
        let service = service();
        let document = NodeDocument::new("form").with_child(NodeDocument::new("ghost"));
        let mut tree = ModelTree::new();
        assert!(service.instantiate(&mut tree, &document).is_err());
        assert!(tree.is_empty());
    }

    // =========================================================================
    // set_property
    // =========================================================================

    #[test]
    fn set_property_validates_against_the_contract() {
        let service = service();
        let (mut tree, _, label) = form_tree();

        let previous = service
            .set_property(&mut tree, label, "value", Binding::expression("user.name").into())
            .unwrap();
        assert_eq!(previous, Some(Value::Binding(Binding::literal("Name"))));

        let err = service
            .set_property(&mut tree, label, "value", Value::from("bare"))
            .unwrap_err();
        assert!(matches!(err, EditorError::Rejected { .. }));
        assert!(err.to_string().contains("'value'"));

        let err = service
            .set_property(&mut tree, label, "nope", Value::Null)
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::Registry(RegistryError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn numbers_are_checked_by_type() {
        let service = service();
        let mut tree = ModelTree::new();
        let col = tree.insert(ModelNode::new("col"));
        assert!(service.set_property(&mut tree, col, "columns", Value::from(6)).is_ok());
        assert!(service.set_property(&mut tree, col, "columns", Value::from("six")).is_err());
    }
}
