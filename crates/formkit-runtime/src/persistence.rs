#![forbid(unsafe_code)]

//! Saving and loading form documents.
//!
//! A saved form is a [`Document`]: a format version plus the minimal
//! [`NodeDocument`] of the root, with default-valued properties and empty
//! child lists stripped. Loading reverses this: the version is checked, the
//! nodes are imported into a tree, parent links are rebuilt, and the missing
//! defaults are filled back in.
//!
//! Writing the bytes somewhere (a download, a file) is the job of an
//! [`ExportSink`].

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use formkit_core::document::NodeDocument;
use formkit_core::model::{ModelTree, NodeId};
use serde::{Deserialize, Serialize};

use crate::editor_service::{EditorError, EditorService};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PersistenceError {
    Json(serde_json::Error),
    UnsupportedVersion { found: u32, expected: u32 },
    Editor(EditorError),
    /// The sink could not store the data.
    Sink(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "document JSON error: {e}"),
            Self::UnsupportedVersion { found, expected } => {
                write!(f, "unsupported document version {found} (expected {expected})")
            }
            Self::Editor(e) => write!(f, "document error: {e}"),
            Self::Sink(msg) => write!(f, "export sink error: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Editor(e) => Some(e),
            Self::UnsupportedVersion { .. } | Self::Sink(_) => None,
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<EditorError> for PersistenceError {
    fn from(e: EditorError) -> Self {
        Self::Editor(e)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A saved form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub root: NodeDocument,
}

impl Document {
    /// Wrap `root` with the current format version.
    #[must_use]
    pub fn new(root: NodeDocument) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            root,
        }
    }
}

/// Minimal document for the subtree at `root`.
pub fn export_document(editor: &EditorService, tree: &ModelTree, root: NodeId) -> PersistenceResult<Document> {
    let mut node = editor.copy_model(tree, root, true)?;
    editor.strip_model(&mut node)?;
    tracing::debug!(root = %root, nodes = node.node_count(), "document exported");
    Ok(Document::new(node))
}

/// Load `document` into `tree` as a detached subtree and return its root.
///
/// Nothing is inserted when the version or any component id is unknown.
pub fn import_document(
    editor: &EditorService,
    tree: &mut ModelTree,
    document: &Document,
) -> PersistenceResult<NodeId> {
    if document.version != DOCUMENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: document.version,
            expected: DOCUMENT_VERSION,
        });
    }
    let root = editor.instantiate(tree, &document.root)?;
    tracing::debug!(root = %root, nodes = document.root.node_count(), "document imported");
    Ok(root)
}

pub fn to_json(document: &Document) -> PersistenceResult<String> {
    Ok(serde_json::to_string(document)?)
}

pub fn to_json_pretty(document: &Document) -> PersistenceResult<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a document. The version is checked on import, not here.
pub fn from_json(json: &str) -> PersistenceResult<Document> {
    Ok(serde_json::from_str(json)?)
}

// ---------------------------------------------------------------------------
// Export sinks
// ---------------------------------------------------------------------------

/// Destination for exported bytes.
pub trait ExportSink: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Store `data` under `filename`, replacing anything already there.
    fn save(&self, data: &[u8], filename: &str) -> PersistenceResult<()>;
}

/// In-memory sink, for tests and previews.
#[derive(Default)]
pub struct MemorySink {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents saved under `filename`.
    pub fn get(&self, filename: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let guard = self
            .files
            .read()
            .map_err(|_| PersistenceError::Sink("lock poisoned".into()))?;
        Ok(guard.get(filename).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().map(|g| g.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExportSink for MemorySink {
    fn name(&self) -> &str {
        "MemorySink"
    }

    fn save(&self, data: &[u8], filename: &str) -> PersistenceResult<()> {
        let mut guard = self
            .files
            .write()
            .map_err(|_| PersistenceError::Sink("lock poisoned".into()))?;
        guard.insert(filename.to_string(), data.to_vec());
        Ok(())
    }
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink").field("files", &self.len()).finish()
    }
}

/// Serialise `document` as pretty JSON and hand it to `sink`.
pub fn save_document(sink: &dyn ExportSink, document: &Document, filename: &str) -> PersistenceResult<()> {
    let json = to_json_pretty(document)?;
    sink.save(json.as_bytes(), filename)?;
    tracing::debug!(sink = sink.name(), filename, bytes = json.len(), "document saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use formkit_core::model::{ModelNode, Properties};
    use formkit_core::value::{Binding, Value};
    use formkit_widgets::catalog;

    fn editor() -> EditorService {
        EditorService::new(Arc::new(catalog::standard().unwrap()))
    }

    fn form(editor: &EditorService) -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let form = tree.insert(ModelNode::container("form").with_value("name", "signup"));
        let label = tree.insert(ModelNode::new("label").with_value("value", Binding::expression("user.name")));
        tree.append_child(form, label).unwrap();
        editor.connect_model(&mut tree, form).unwrap();
        (tree, form)
    }

    #[test]
    fn export_is_minimal() {
        let editor = editor();
        let mut tree = ModelTree::new();
        let form = tree.insert(ModelNode::container("form").with_value("name", "f"));
        editor.connect_model(&mut tree, form).unwrap();

        let document = export_document(&editor, &tree, form).unwrap();
        assert_eq!(
            to_json(&document).unwrap(),
            r#"{"version":1,"root":{"id":"form","name":"f"}}"#
        );
    }

    #[test]
    fn json_round_trip_restores_an_equivalent_tree() {
        let editor = editor();
        let (tree, form) = form(&editor);
        let json = to_json_pretty(&export_document(&editor, &tree, form).unwrap()).unwrap();

        let mut loaded = ModelTree::new();
        let root = import_document(&editor, &mut loaded, &from_json(&json).unwrap()).unwrap();
        assert!(!editor.diff(&loaded[root], &tree[form]).unwrap());
        let label = loaded.children(root)[0];
        assert_eq!(loaded.parent(label), Some(root));
        assert_eq!(loaded[label].component_id(), "label");
        assert_eq!(
            loaded[label].value("value"),
            Some(&Value::Binding(Binding::expression("user.name")))
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let editor = editor();
        let document = Document {
            version: 7,
            root: NodeDocument::new("form"),
        };
        let mut tree = ModelTree::new();
        let err = import_document(&editor, &mut tree, &document).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion { found: 7, expected: 1 }
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn unknown_component_is_rejected() {
        let editor = editor();
        let document = from_json(r#"{"version":1,"root":{"id":"marquee"}}"#).unwrap();
        let mut tree = ModelTree::new();
        let err = import_document(&editor, &mut tree, &document).unwrap_err();
        assert!(matches!(err, PersistenceError::Editor(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_json_chains_the_parser_error() {
        let err = from_json("{not json").unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
        assert!(err.to_string().starts_with("document JSON error"));
    }

    #[test]
    fn memory_sink_stores_pretty_json() {
        let editor = editor();
        let (tree, form) = form(&editor);
        let document = export_document(&editor, &tree, form).unwrap();
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        save_document(&sink, &document, "form.json").unwrap();
        let bytes = sink.get("form.json").unwrap().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(from_json(&text).unwrap(), document);
        assert_eq!(sink.len(), 1);
    }
}
