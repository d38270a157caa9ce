#![forbid(unsafe_code)]

//! Undo history.
//!
//! An [`Action`] is a reversible tree mutation. [`ActionHistory::push`]
//! applies an action and records it; [`undo`](ActionHistory::undo) reverts
//! and discards the newest entry. There is no redo.
//!
//! [`EditorHistory`] layers the editor's policy on top: property edits to
//! the selected node are coalesced into a single modification entry until
//! the selection changes, and that entry disappears again when the node's
//! properties return to their state at selection time.

use std::fmt;

use formkit_core::document::NodeDocument;
use formkit_core::model::{ModelTree, NodeId, PropertiesMut, TreeError};

use crate::editor_service::{EditorError, EditorService};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    Tree(TreeError),
    Editor(EditorError),
    /// Deleting a node that has no parent.
    NotAttached(NodeId),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "history: {e}"),
            Self::Editor(e) => write!(f, "history: {e}"),
            Self::NotAttached(node) => write!(f, "history: node {node} has no parent"),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            Self::Editor(e) => Some(e),
            Self::NotAttached(_) => None,
        }
    }
}

impl From<TreeError> for HistoryError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<EditorError> for HistoryError {
    fn from(e: EditorError) -> Self {
        Self::Editor(e)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A reversible tree mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Properties were edited in place. Applying is a no-op; reverting copies
    /// `original`'s properties back onto the node.
    Modification { node: NodeId, original: NodeDocument },
    /// Move `node` under `new_parent` (or just detach it).
    Reparent {
        node: NodeId,
        new_parent: Option<NodeId>,
        /// Parent and index before the move, filled in when applied.
        old_location: Option<(NodeId, usize)>,
        /// Set when applying gave `new_parent` its child list.
        created_children: bool,
    },
    /// Swap two children of `parent`. Self-inverse.
    ReorderChild {
        parent: NodeId,
        first: usize,
        second: usize,
    },
    /// Append a detached `node` to `parent`.
    Create {
        node: NodeId,
        parent: NodeId,
        /// Set when applying gave `parent` its child list.
        created_children: bool,
    },
    /// Detach `node` from its parent.
    Delete {
        node: NodeId,
        /// Parent and index before the delete, filled in when applied.
        old_location: Option<(NodeId, usize)>,
    },
}

impl Action {
    #[must_use]
    pub fn modification(node: NodeId, original: NodeDocument) -> Self {
        Self::Modification { node, original }
    }

    #[must_use]
    pub fn reparent(node: NodeId, new_parent: Option<NodeId>) -> Self {
        Self::Reparent {
            node,
            new_parent,
            old_location: None,
            created_children: false,
        }
    }

    #[must_use]
    pub fn reorder_child(parent: NodeId, first: usize, second: usize) -> Self {
        Self::ReorderChild {
            parent,
            first,
            second,
        }
    }

    #[must_use]
    pub fn create(node: NodeId, parent: NodeId) -> Self {
        Self::Create {
            node,
            parent,
            created_children: false,
        }
    }

    #[must_use]
    pub fn delete(node: NodeId) -> Self {
        Self::Delete {
            node,
            old_location: None,
        }
    }

    /// Label used by the editor entry points.
    #[must_use]
    pub const fn default_label(&self) -> &'static str {
        match self {
            Self::Modification { .. } => "property change",
            Self::Reparent { .. } => "reparent",
            Self::ReorderChild { .. } => "reorder",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
        }
    }

    /// Perform the mutation. The tree is unchanged when this fails.
    fn apply(&mut self, tree: &mut ModelTree) -> Result<(), HistoryError> {
        match self {
            Self::Modification { node, .. } => {
                tree.node(*node)?;
            }
            Self::Reparent {
                node,
                new_parent,
                old_location,
                created_children,
            } => {
                tree.node(*node)?;
                if let Some(parent) = *new_parent {
                    tree.node(parent)?;
                    if tree.is_ancestor_or_self(*node, parent) {
                        return Err(TreeError::Cycle {
                            node: *node,
                            parent,
                        }
                        .into());
                    }
                }
                *old_location = tree.detach(*node)?;
                if let Some(parent) = *new_parent {
                    *created_children = tree.node(parent)?.children().is_none();
                    tree.append_child(parent, *node)?;
                }
            }
            Self::ReorderChild {
                parent,
                first,
                second,
            } => tree.swap_children(*parent, *first, *second)?,
            Self::Create {
                node,
                parent,
                created_children,
            } => {
                *created_children = tree.node(*parent)?.children().is_none();
                tree.append_child(*parent, *node)?;
            }
            Self::Delete { node, old_location } => {
                if tree.parent(*node).is_none() {
                    tree.node(*node)?;
                    return Err(HistoryError::NotAttached(*node));
                }
                *old_location = tree.detach(*node)?;
            }
        }
        Ok(())
    }

    /// Undo the mutation performed by [`apply`](Self::apply).
    fn revert(&self, tree: &mut ModelTree, editor: &EditorService) -> Result<(), HistoryError> {
        match self {
            Self::Modification { node, original } => {
                editor.copy_properties(original, tree.node_mut(*node)?)?;
            }
            Self::Reparent {
                node,
                new_parent,
                old_location,
                created_children,
            } => {
                tree.detach(*node)?;
                if let Some(parent) = new_parent.filter(|_| *created_children) {
                    tree.node_mut(parent)?.clear_empty_children();
                }
                if let Some((parent, index)) = *old_location {
                    tree.insert_child(parent, index, *node)?;
                }
            }
            Self::Delete { node, old_location } => {
                tree.detach(*node)?;
                if let Some((parent, index)) = *old_location {
                    tree.insert_child(parent, index, *node)?;
                }
            }
            Self::ReorderChild {
                parent,
                first,
                second,
            } => tree.swap_children(*parent, *first, *second)?,
            Self::Create {
                node,
                parent,
                created_children,
            } => {
                tree.detach(*node)?;
                if *created_children {
                    tree.node_mut(*parent)?.clear_empty_children();
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ActionHistory
// ---------------------------------------------------------------------------

/// One recorded action.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    label: String,
    seq: u64,
    action: Action,
}

impl HistoryEntry {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sequence number, unique within one history.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// Log of applied actions, newest last.
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    entries: Vec<HistoryEntry>,
    next_seq: u64,
}

impl ActionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action` to `tree` and record it. Failed actions are not recorded.
    pub fn push(
        &mut self,
        tree: &mut ModelTree,
        label: impl Into<String>,
        mut action: Action,
    ) -> Result<u64, HistoryError> {
        action.apply(tree)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        let label = label.into();
        tracing::debug!(action = %label, seq, depth = self.entries.len() + 1, "action pushed");
        self.entries.push(HistoryEntry { label, seq, action });
        Ok(seq)
    }

    /// Revert and discard the newest entry. Returns `false` when empty.
    ///
    /// A failed revert leaves the entry in place.
    pub fn undo(&mut self, tree: &mut ModelTree, editor: &EditorService) -> Result<bool, HistoryError> {
        let Some(entry) = self.entries.last() else {
            return Ok(false);
        };
        entry.action.revert(tree, editor)?;
        tracing::debug!(action = %entry.label, seq = entry.seq, depth = self.entries.len() - 1, "action undone");
        self.entries.pop();
        Ok(true)
    }

    /// Undo every entry, newest first. Returns how many were reverted.
    pub fn revert(&mut self, tree: &mut ModelTree, editor: &EditorService) -> Result<usize, HistoryError> {
        let mut reverted = 0;
        while let Some(entry) = self.entries.last() {
            entry.action.revert(tree, editor)?;
            self.entries.pop();
            reverted += 1;
        }
        tracing::debug!(reverted, "history reverted");
        Ok(reverted)
    }

    /// Forget every entry without reverting; the current tree becomes the baseline.
    pub fn clear(&mut self) {
        tracing::debug!(dropped = self.entries.len(), "history cleared");
        self.entries.clear();
    }

    /// Drop the entry with sequence number `seq` without reverting it.
    pub fn remove(&mut self, seq: u64) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.seq == seq)?;
        let entry = self.entries.remove(index);
        tracing::trace!(action = %entry.label, seq, "entry removed");
        Some(entry)
    }

    #[must_use]
    pub fn contains(&self, seq: u64) -> bool {
        self.entries.iter().any(|e| e.seq == seq)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter().rev()
    }

    /// Labels, newest first.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.entries().map(HistoryEntry::label).collect()
    }
}

// ---------------------------------------------------------------------------
// EditorHistory
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Selection {
    node: NodeId,
    /// Shallow copy of the node's properties as of selection time, or as of
    /// the last structural action.
    original: NodeDocument,
    /// Pending modification entry.
    modification: Option<u64>,
}

/// History with the editor's selection-scoped modification coalescing.
#[derive(Debug)]
pub struct EditorHistory {
    editor: EditorService,
    history: ActionHistory,
    selection: Option<Selection>,
}

impl EditorHistory {
    #[must_use]
    pub fn new(editor: EditorService) -> Self {
        Self {
            editor,
            history: ActionHistory::new(),
            selection: None,
        }
    }

    #[must_use]
    pub fn editor(&self) -> &EditorService {
        &self.editor
    }

    #[must_use]
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    /// The selected node.
    #[must_use]
    pub fn selection(&self) -> Option<NodeId> {
        self.selection.as_ref().map(|s| s.node)
    }

    /// Change the selection. Ends any pending modification.
    pub fn select(&mut self, tree: &ModelTree, node: Option<NodeId>) -> Result<(), HistoryError> {
        self.selection = None;
        if let Some(node) = node {
            let original = self.editor.copy_model(tree, node, false)?;
            self.selection = Some(Selection {
                node,
                original,
                modification: None,
            });
        }
        Ok(())
    }

    /// Notify that the selected node's properties were edited in place.
    pub fn object_changed(&mut self, tree: &mut ModelTree) -> Result<(), HistoryError> {
        let Some(selection) = &mut self.selection else {
            return Ok(());
        };
        let pending = selection
            .modification
            .filter(|&seq| self.history.contains(seq));

        match pending {
            None => {
                let action = Action::modification(selection.node, selection.original.clone());
                let label = action.default_label();
                let seq = self.history.push(tree, label, action)?;
                selection.modification = Some(seq);
                tracing::trace!(node = %selection.node, seq, "modification recorded");
            }
            Some(seq) => {
                let live = tree.node(selection.node)?;
                if self.editor.diff(&selection.original, live)? {
                    tracing::trace!(node = %selection.node, seq, "modification coalesced");
                } else {
                    self.history.remove(seq);
                    selection.modification = None;
                    tracing::trace!(node = %selection.node, seq, "modification discarded");
                }
            }
        }
        Ok(())
    }

    fn push_structural(&mut self, tree: &mut ModelTree, action: Action) -> Result<u64, HistoryError> {
        let label = action.default_label();
        let seq = self.history.push(tree, label, action)?;
        if let Some(selection) = &mut self.selection {
            selection.modification = None;
            selection.original = self.editor.copy_model(tree, selection.node, false)?;
        }
        Ok(seq)
    }

    /// Move `node` under `new_parent`, or detach it when `None`.
    pub fn reparent(
        &mut self,
        tree: &mut ModelTree,
        node: NodeId,
        new_parent: Option<NodeId>,
    ) -> Result<u64, HistoryError> {
        self.push_structural(tree, Action::reparent(node, new_parent))
    }

    /// Attach the freshly created, detached `node` to `parent`.
    pub fn created(&mut self, tree: &mut ModelTree, node: NodeId, parent: NodeId) -> Result<u64, HistoryError> {
        self.push_structural(tree, Action::create(node, parent))
    }

    pub fn deleted(&mut self, tree: &mut ModelTree, node: NodeId) -> Result<u64, HistoryError> {
        self.push_structural(tree, Action::delete(node))
    }

    pub fn reorder_child(
        &mut self,
        tree: &mut ModelTree,
        parent: NodeId,
        first: usize,
        second: usize,
    ) -> Result<u64, HistoryError> {
        self.push_structural(tree, Action::reorder_child(parent, first, second))
    }

    pub fn undo(&mut self, tree: &mut ModelTree) -> Result<bool, HistoryError> {
        self.history.undo(tree, &self.editor)
    }

    pub fn revert(&mut self, tree: &mut ModelTree) -> Result<usize, HistoryError> {
        self.history.revert(tree, &self.editor)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }
}
