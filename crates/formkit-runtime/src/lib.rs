#![forbid(unsafe_code)]

//! Editor runtime for the formkit UI builder.
//!
//! - [`change_detector`]: snapshot-based dirty checks for a single node.
//! - [`editor_service`]: registry-driven diff, copy, strip, and connect
//!   operations over model trees and documents.
//! - [`history`]: reversible actions, the undo log, and the editor's
//!   modification coalescing.
//! - [`drop`]: the drop-target contract used by the external drag layer.
//! - [`persistence`]: versioned JSON documents and export sinks.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use formkit_core::model::{ModelNode, ModelTree, PropertiesMut};
//! use formkit_runtime::{EditorHistory, EditorService};
//!
//! let registry = Arc::new(formkit_widgets::catalog::standard().unwrap());
//! let mut history = EditorHistory::new(EditorService::new(registry));
//! let mut tree = ModelTree::new();
//! let label = tree.insert(ModelNode::new("label"));
//!
//! history.select(&tree, Some(label)).unwrap();
//! tree[label].set_value("name", "first".into());
//! history.object_changed(&mut tree).unwrap();
//! assert!(history.is_dirty());
//!
//! history.undo(&mut tree).unwrap();
//! assert!(!history.is_dirty());
//! ```

pub mod change_detector;
pub mod drop;
pub mod editor_service;
pub mod history;
pub mod persistence;

pub use change_detector::ChangeDetector;
pub use drop::{DropResult, DropTarget, NodeDropTarget};
pub use editor_service::{EditorError, EditorService};
pub use history::{Action, ActionHistory, EditorHistory, HistoryEntry, HistoryError};
pub use persistence::{
    DOCUMENT_VERSION, Document, ExportSink, MemorySink, PersistenceError, PersistenceResult,
    export_document, from_json, import_document, save_document, to_json, to_json_pretty,
};
