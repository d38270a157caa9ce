#![forbid(unsafe_code)]

//! Drag sources.
//!
//! The editor's drag layer (gesture detection, hit testing) lives outside
//! this crate. It talks to the core through two narrow contracts: a
//! [`DragSource`] creates fresh node documents for palette drags, and a
//! [`DragPayload`] describes what is being dragged so that drop targets can
//! decide whether to accept it.

use formkit_core::document::NodeDocument;
use formkit_core::model::NodeId;

use crate::component::UIComponent;

/// Drag type prefix for new instances dragged out of the palette.
pub const COMPONENT_DRAG_PREFIX: &str = "component";
/// Drag type prefix for existing nodes moved within the canvas.
pub const NODE_DRAG_PREFIX: &str = "node";

// ---------------------------------------------------------------------------
// DragSource
// ---------------------------------------------------------------------------

/// Something that can be dragged onto the canvas to create a node.
pub trait DragSource {
    /// Component id of the nodes this source creates.
    fn source_id(&self) -> &str;

    /// A fresh node document, defaults filled in.
    fn create(&self) -> NodeDocument;

    /// Payload announcing a drag from this source.
    fn payload(&self) -> DragPayload {
        DragPayload::create(self.source_id())
    }
}

impl DragSource for UIComponent {
    fn source_id(&self) -> &str {
        self.id()
    }

    fn create(&self) -> NodeDocument {
        self.create_default()
    }

    fn payload(&self) -> DragPayload {
        DragPayload::create(self.id()).with_display_text(self.label())
    }
}

// ---------------------------------------------------------------------------
// DragPayload
// ---------------------------------------------------------------------------

/// What a drag carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSubject {
    /// A new instance, created on drop.
    Create,
    /// An existing node being moved.
    Move(NodeId),
}

/// Data carried during a drag operation.
///
/// The drag type is `component/<id>` for palette drags and `node/<id>` for
/// moves, where `<id>` is the component id in both cases.
///
/// ```
/// # use formkit_widgets::drag::DragPayload;
/// let payload = DragPayload::create("input");
/// assert_eq!(payload.drag_type, "component/input");
/// assert!(payload.matches_type("component/*"));
/// assert_eq!(payload.component_id(), "input");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub drag_type: String,
    pub subject: DragSubject,
    /// Preview text shown during the drag.
    pub display_text: Option<String>,
}

impl DragPayload {
    /// Payload for creating a new `component_id` instance.
    #[must_use]
    pub fn create(component_id: &str) -> Self {
        Self {
            drag_type: format!("{COMPONENT_DRAG_PREFIX}/{component_id}"),
            subject: DragSubject::Create,
            display_text: None,
        }
    }

    /// Payload for moving the existing node `node` of kind `component_id`.
    #[must_use]
    pub fn moving(node: NodeId, component_id: &str) -> Self {
        Self {
            drag_type: format!("{NODE_DRAG_PREFIX}/{component_id}"),
            subject: DragSubject::Move(node),
            display_text: None,
        }
    }

    #[must_use]
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// Component id encoded in the drag type.
    #[must_use]
    pub fn component_id(&self) -> &str {
        self.drag_type
            .split_once('/')
            .map_or(self.drag_type.as_str(), |(_, id)| id)
    }

    /// The moved node, for move drags.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self.subject {
            DragSubject::Move(node) => Some(node),
            DragSubject::Create => None,
        }
    }

    /// Exact match, `*`, or a `prefix/*` wildcard.
    #[must_use]
    pub fn matches_type(&self, pattern: &str) -> bool {
        if pattern == "*" || pattern == "*/*" {
            return true;
        }
        match pattern.strip_suffix("/*") {
            Some(prefix) => {
                self.drag_type.starts_with(prefix)
                    && self.drag_type.as_bytes().get(prefix.len()) == Some(&b'/')
            }
            None => self.drag_type == pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn component_creates_defaulted_document() {
        let registry = catalog::standard().unwrap();
        let button = registry.component("button").unwrap();
        let doc = DragSource::create(button);
        assert_eq!(doc.id, "button");
        assert_eq!(doc.children, Some(vec![]));
        assert_eq!(button.source_id(), "button");
        let payload = button.payload();
        assert_eq!(payload.drag_type, "component/button");
        assert_eq!(payload.display_text.as_deref(), Some("Button"));
        assert_eq!(payload.node(), None);
    }

    #[test]
    fn move_payload_carries_node() {
        let payload = DragPayload::moving(NodeId::from_raw(3), "col");
        assert_eq!(payload.node(), Some(NodeId::from_raw(3)));
        assert_eq!(payload.component_id(), "col");
        assert!(payload.matches_type("node/*"));
        assert!(!payload.matches_type("component/*"));
        assert!(!payload.matches_type("no/*"));
        assert!(payload.matches_type("*"));
        assert!(payload.matches_type("node/col"));
    }
}
