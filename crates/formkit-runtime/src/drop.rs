#![forbid(unsafe_code)]

//! Drop targets.
//!
//! The drag layer asks a [`DropTarget`] whether a [`DragPayload`] may land on
//! it, then hands the payload over on release. [`NodeDropTarget`] is the
//! canvas implementation: it checks nesting rules, then creates or moves the
//! node through the editor history so the drop can be undone.

use formkit_core::model::{ModelTree, NodeId, Properties};
use formkit_widgets::drag::{COMPONENT_DRAG_PREFIX, NODE_DRAG_PREFIX};
use formkit_widgets::{DragPayload, DragSource, DragSubject};

use crate::editor_service::EditorError;
use crate::history::{EditorHistory, HistoryError};

/// Outcome of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResult {
    /// The payload was placed; `node` is the created or moved node.
    Accepted { node: NodeId },
    /// The target refused the payload. The tree is unchanged.
    Rejected { reason: String },
}

impl DropResult {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Accepted { node } => Some(*node),
            Self::Rejected { .. } => None,
        }
    }
}

/// Something a drag can be released onto.
pub trait DropTarget {
    /// Whether `payload` may be dropped here.
    fn drop_allowed(&self, tree: &ModelTree, payload: &DragPayload) -> bool;

    /// Accept `payload`. Rejections are reported in the result; errors mean
    /// the tree or registry was inconsistent.
    fn dropped(&mut self, tree: &mut ModelTree, payload: &DragPayload) -> Result<DropResult, HistoryError>;
}

/// A model node acting as a drop target.
#[derive(Debug)]
pub struct NodeDropTarget<'a> {
    node: NodeId,
    history: &'a mut EditorHistory,
}

impl<'a> NodeDropTarget<'a> {
    #[must_use]
    pub fn new(node: NodeId, history: &'a mut EditorHistory) -> Self {
        Self { node, history }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Why `payload` cannot land here, or `None` when it can.
    fn rejection(&self, tree: &ModelTree, payload: &DragPayload) -> Option<String> {
        let Ok(target) = tree.node(self.node) else {
            return Some(format!("unknown drop target {}", self.node));
        };
        let component_id = match payload.subject {
            DragSubject::Create => {
                if !payload.matches_type(&format!("{COMPONENT_DRAG_PREFIX}/*")) {
                    return Some(format!("unsupported drag type '{}'", payload.drag_type));
                }
                payload.component_id()
            }
            DragSubject::Move(moved) => {
                if !payload.matches_type(&format!("{NODE_DRAG_PREFIX}/*")) {
                    return Some(format!("unsupported drag type '{}'", payload.drag_type));
                }
                let Ok(node) = tree.node(moved) else {
                    return Some(format!("unknown node {moved}"));
                };
                if tree.is_ancestor_or_self(moved, self.node) {
                    return Some("cannot drop a node into itself".to_string());
                }
                node.component_id()
            }
        };
        let Some(component) = self.history.editor().registry().find(component_id) else {
            return Some(format!("unknown component '{component_id}'"));
        };
        if component.is_abstract() {
            return Some(format!("'{component_id}' cannot be instantiated"));
        }
        if !component.is_valid_parent(target.component_id()) {
            return Some(format!(
                "'{component_id}' cannot be placed in '{}'",
                target.component_id()
            ));
        }
        None
    }
}

impl DropTarget for NodeDropTarget<'_> {
    fn drop_allowed(&self, tree: &ModelTree, payload: &DragPayload) -> bool {
        self.rejection(tree, payload).is_none()
    }

    fn dropped(&mut self, tree: &mut ModelTree, payload: &DragPayload) -> Result<DropResult, HistoryError> {
        if let Some(reason) = self.rejection(tree, payload) {
            tracing::debug!(
                target_node = %self.node,
                drag_type = %payload.drag_type,
                reason = %reason,
                "drop rejected"
            );
            return Ok(DropResult::Rejected { reason });
        }
        let node = match payload.subject {
            DragSubject::Create => {
                let editor = self.history.editor().clone();
                let source = editor
                    .registry()
                    .component(payload.component_id())
                    .map_err(EditorError::from)?;
                let node = editor.instantiate(tree, &source.create())?;
                self.history.created(tree, node, self.node)?;
                node
            }
            DragSubject::Move(node) => {
                self.history.reparent(tree, node, Some(self.node))?;
                node
            }
        };
        tracing::debug!(target_node = %self.node, node = %node, drag_type = %payload.drag_type, "drop accepted");
        Ok(DropResult::Accepted { node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use formkit_core::model::ModelNode;
    use formkit_widgets::catalog;

    use crate::editor_service::EditorService;

    fn history() -> EditorHistory {
        EditorHistory::new(EditorService::new(Arc::new(catalog::standard().unwrap())))
    }

    /// body > form > div
    fn canvas() -> (ModelTree, NodeId, NodeId, NodeId) {
        let mut tree = ModelTree::new();
        let body = tree.insert(ModelNode::container("body"));
        let form = tree.insert(ModelNode::container("form"));
        let div = tree.insert(ModelNode::container("div"));
        tree.append_child(body, form).unwrap();
        tree.append_child(form, div).unwrap();
        (tree, body, form, div)
    }

    #[test]
    fn palette_drop_creates_an_undoable_node() {
        let (mut tree, _, form, _) = canvas();
        let mut history = history();
        let payload = DragPayload::create("label");

        let result = {
            let mut target = NodeDropTarget::new(form, &mut history);
            assert!(target.drop_allowed(&tree, &payload));
            target.dropped(&mut tree, &payload).unwrap()
        };
        let label = result.node().unwrap();
        assert_eq!(tree.children(form).last(), Some(&label));
        assert_eq!(tree[label].component_id(), "label");
        assert!(tree[label].has_value("class"));
        assert_eq!(history.history().labels(), ["create"]);

        history.undo(&mut tree).unwrap();
        assert_eq!(tree.parent(label), None);
    }

    #[test]
    fn nesting_rules_reject_without_touching_the_tree() {
        let (mut tree, _, form, _) = canvas();
        let before = tree.clone();
        let mut history = history();
        let payload = DragPayload::create("input");

        let mut target = NodeDropTarget::new(form, &mut history);
        assert!(!target.drop_allowed(&tree, &payload));
        let result = target.dropped(&mut tree, &payload).unwrap();
        assert!(!result.is_accepted());
        assert_eq!(tree, before);
        assert!(!history.is_dirty());
    }

    #[test]
    fn abstract_and_unknown_components_are_rejected() {
        let (tree, body, _, _) = canvas();
        let mut history = history();
        let target = NodeDropTarget::new(body, &mut history);
        assert!(!target.drop_allowed(&tree, &DragPayload::create("base")));
        assert!(!target.drop_allowed(&tree, &DragPayload::create("ghost")));
    }

    #[test]
    fn moves_go_through_reparent() {
        let (mut tree, body, form, div) = canvas();
        let mut history = history();
        let payload = DragPayload::moving(div, "div");

        let result = NodeDropTarget::new(body, &mut history)
            .dropped(&mut tree, &payload)
            .unwrap();
        assert_eq!(result, DropResult::Accepted { node: div });
        assert_eq!(tree.children(body), &[form, div]);
        assert!(tree.children(form).is_empty());

        history.undo(&mut tree).unwrap();
        assert_eq!(tree.children(form), &[div]);
    }

    #[test]
    fn a_node_cannot_be_dropped_into_its_own_subtree() {
        let mut tree = ModelTree::new();
        let outer = tree.insert(ModelNode::container("form"));
        let inner = tree.insert(ModelNode::container("form"));
        tree.append_child(outer, inner).unwrap();
        let mut history = history();

        let payload = DragPayload::moving(outer, "form");
        let result = NodeDropTarget::new(inner, &mut history)
            .dropped(&mut tree, &payload)
            .unwrap();
        assert_eq!(result, DropResult::rejected("cannot drop a node into itself"));
    }

    #[test]
    fn mismatched_drag_type_is_rejected() {
        let (tree, body, _, div) = canvas();
        let mut history = history();
        let mut payload = DragPayload::moving(div, "div");
        payload.drag_type = "text/plain".to_string();
        assert!(!NodeDropTarget::new(body, &mut history).drop_allowed(&tree, &payload));
    }
}
