#![forbid(unsafe_code)]

//! Detached, serialisable node trees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Properties, PropertiesMut};
use crate::value::Value;

/// A node subtree outside any [`ModelTree`](crate::model::ModelTree).
///
/// Serialises as `{"id": ..., <fields>..., "children": [...]}`. There is no
/// parent link in this form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Component id.
    pub id: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeDocument>>,
}

impl NodeDocument {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
            children: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: NodeDocument) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(NodeDocument::node_count)
            .sum::<usize>()
    }
}

impl Properties for NodeDocument {
    fn component_id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }
}

impl PropertiesMut for NodeDocument {
    fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.properties
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
