#![forbid(unsafe_code)]

//! The live model tree.
//!
//! Nodes live in an arena ([`ModelTree`]) and are addressed by [`NodeId`].
//! Each node records its component id, its property fields, an optional
//! ordered child list, and a non-owning parent link. Removing a node from its
//! parent only detaches it; the arena slot stays valid so an undo can put it
//! back.
//!
//! # Example
//! ```
//! use formkit_core::model::{ModelNode, ModelTree, Properties};
//! use formkit_core::value::Value;
//!
//! let mut tree = ModelTree::new();
//! let form = tree.insert(ModelNode::container("form"));
//! let input = tree.insert(ModelNode::new("input").with_value("name", "email"));
//! tree.append_child(form, input).unwrap();
//!
//! assert_eq!(tree.children(form), &[input]);
//! assert_eq!(tree[input].parent(), Some(form));
//! assert_eq!(tree[input].value("name"), Some(&Value::from("email")));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::document::NodeDocument;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Handle of a node inside a [`ModelTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Property field access
// ---------------------------------------------------------------------------

/// Read access to the property fields of a live node or a detached document.
pub trait Properties {
    /// Id of the component kind this node instantiates.
    fn component_id(&self) -> &str;

    fn fields(&self) -> &BTreeMap<String, Value>;

    /// Raw field read; no defaulting.
    fn value(&self, name: &str) -> Option<&Value> {
        self.fields().get(name)
    }

    fn has_value(&self, name: &str) -> bool {
        self.fields().contains_key(name)
    }
}

/// Write access to property fields.
pub trait PropertiesMut: Properties {
    fn fields_mut(&mut self) -> &mut BTreeMap<String, Value>;

    /// Store a field, returning the previous value.
    fn set_value(&mut self, name: &str, value: Value) -> Option<Value> {
        self.fields_mut().insert(name.to_string(), value)
    }

    fn remove_value(&mut self, name: &str) -> Option<Value> {
        self.fields_mut().remove(name)
    }

    /// Drop the child list if it is empty. Returns whether it was dropped.
    fn clear_empty_children(&mut self) -> bool;
}

// ---------------------------------------------------------------------------
// ModelNode
// ---------------------------------------------------------------------------

/// One instance of a component kind inside a [`ModelTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    component: String,
    fields: BTreeMap<String, Value>,
    children: Option<Vec<NodeId>>,
    parent: Option<NodeId>,
}

impl ModelNode {
    /// A leaf node without a child list.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            fields: BTreeMap::new(),
            children: None,
            parent: None,
        }
    }

    /// A node with an empty child list.
    #[must_use]
    pub fn container(component: impl Into<String>) -> Self {
        Self {
            children: Some(Vec::new()),
            ..Self::new(component)
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Child list, `None` when the node never had one.
    #[must_use]
    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }

    /// The non-owning parent link.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ensure a child list exists.
    pub fn ensure_children(&mut self) {
        self.children.get_or_insert_with(Vec::new);
    }
}

impl Properties for ModelNode {
    fn component_id(&self) -> &str {
        &self.component
    }

    fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl PropertiesMut for ModelNode {
    fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.fields
    }

    fn clear_empty_children(&mut self) -> bool {
        if self.children.as_ref().is_some_and(Vec::is_empty) {
            self.children = None;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural errors raised by [`ModelTree`] mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    UnknownNode(NodeId),
    /// The node already has a parent; detach it first.
    Attached { node: NodeId, parent: NodeId },
    /// Attaching would make a node its own ancestor.
    Cycle { node: NodeId, parent: NodeId },
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::Attached { node, parent } => {
                write!(f, "node {node} is already a child of {parent}")
            }
            Self::Cycle { node, parent } => {
                write!(f, "cannot attach {node} below its own descendant {parent}")
            }
            Self::IndexOutOfRange { parent, index, len } => {
                write!(f, "child index {index} out of range for {parent} ({len} children)")
            }
        }
    }
}

impl std::error::Error for TreeError {}

// ---------------------------------------------------------------------------
// ModelTree
// ---------------------------------------------------------------------------

/// Arena of model nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
}

impl ModelTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arena slots, including detached nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a detached node. Any child or parent links it carries are reset.
    pub fn insert(&mut self, mut node: ModelNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = None;
        if let Some(children) = node.children.as_mut() {
            children.clear();
        }
        self.nodes.push(node);
        id
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        self.nodes.get_mut(id.index())
    }

    /// Like [`get`](Self::get) but with a typed error.
    pub fn node(&self, id: NodeId) -> Result<&ModelNode, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut ModelNode, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    /// Children of `id`; empty for leaves and unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).and_then(ModelNode::children).unwrap_or(&[])
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(ModelNode::parent)
    }

    #[must_use]
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Append a detached node to `parent`'s child list, creating the list if needed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Insert a detached node at `index` in `parent`'s child list.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.node(parent)?;
        if let Some(existing) = self.node(child)?.parent {
            return Err(TreeError::Attached {
                node: child,
                parent: existing,
            });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle {
                node: child,
                parent,
            });
        }
        let node = self.node_mut(parent)?;
        let children = node.children.get_or_insert_with(Vec::new);
        if index > children.len() {
            return Err(TreeError::IndexOutOfRange {
                parent,
                index,
                len: children.len(),
            });
        }
        children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from its parent, returning the old parent and index.
    ///
    /// Already-detached nodes yield `Ok(None)`.
    pub fn detach(&mut self, child: NodeId) -> Result<Option<(NodeId, usize)>, TreeError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(None);
        };
        let index = self.index_of(parent, child);
        if let (Some(index), Some(children)) = (index, self.node_mut(parent)?.children.as_mut()) {
            children.remove(index);
        }
        self.node_mut(child)?.parent = None;
        Ok(index.map(|index| (parent, index)))
    }

    /// Swap two entries of `parent`'s child list.
    pub fn swap_children(&mut self, parent: NodeId, a: usize, b: usize) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        let bad = [a, b].into_iter().find(|&i| i >= len);
        if let Some(index) = bad {
            return Err(TreeError::IndexOutOfRange { parent, index, len });
        }
        if let Some(children) = self.node_mut(parent)?.children.as_mut() {
            children.swap(a, b);
        }
        Ok(())
    }

    /// `root` followed by all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Add a detached document subtree, linking parents. Returns the new root id.
    pub fn import(&mut self, document: &NodeDocument) -> NodeId {
        let id = self.insert(ModelNode {
            component: document.id.clone(),
            fields: document.properties.clone(),
            children: document.children.as_ref().map(|_| Vec::new()),
            parent: None,
        });
        for child in document.children.iter().flatten() {
            let child_id = self.import(child);
            self.nodes[id.index()]
                .children
                .get_or_insert_with(Vec::new)
                .push(child_id);
            self.nodes[child_id.index()].parent = Some(id);
        }
        id
    }

    /// Detached copy of the subtree at `id`, without parent links.
    pub fn export(&self, id: NodeId) -> Result<NodeDocument, TreeError> {
        let node = self.node(id)?;
        let children = match node.children() {
            Some(ids) => Some(
                ids.iter()
                    .map(|&child| self.export(child))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(NodeDocument {
            id: node.component.clone(),
            properties: node.fields.clone(),
            children,
        })
    }

    /// Re-establish the parent links of every node below `root` from the
    /// child lists.
    pub fn relink(&mut self, root: NodeId) -> Result<(), TreeError> {
        self.node(root)?;
        for id in self.descendants(root) {
            let children = self.children(id).to_vec();
            for child in children {
                self.node_mut(child)?.parent = Some(id);
            }
        }
        Ok(())
    }
}

impl Index<NodeId> for ModelTree {
    type Output = ModelNode;

    fn index(&self, id: NodeId) -> &ModelNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for ModelTree {
    fn index_mut(&mut self, id: NodeId) -> &mut ModelNode {
        &mut self.nodes[id.index()]
    }
}
