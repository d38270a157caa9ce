#![forbid(unsafe_code)]

//! formkit public facade crate.
//!
//! Re-exports the value model, template engine, component catalog and
//! editor runtime, plus a prelude for day-to-day use. Enable the `logging`
//! feature for [`logging::init`].
//!
//! # Example
//! ```
//! use formkit::prelude::*;
//!
//! # fn main() -> formkit::Result<()> {
//! let registry = std::sync::Arc::new(catalog::standard()?);
//! let editor = EditorService::new(registry.clone());
//! let mut tree = ModelTree::new();
//! let root = editor.instantiate(&mut tree, &registry.component("h2")?.create())?;
//! editor.set_property(&mut tree, root, "value", Binding::literal("Contact").into())?;
//! assert_eq!(registry.render(&tree, root, RenderMode::Run), "<h2 >Contact</h2>");
//! # Ok(())
//! # }
//! ```

use std::fmt;

#[cfg(feature = "logging")]
pub mod logging;

// --- Core re-exports -------------------------------------------------------

pub use formkit_core::{
    Binding, BindingKind, Difference, ModelNode, ModelTree, NodeDocument, NodeId, Properties,
    PropertiesMut, Property, PropertyType, TreeError, TypeDescriptor, Value,
};

// --- Template re-exports ---------------------------------------------------

pub use formkit_template::{RenderMode, TemplateConfig, TemplateError};

// --- Widget re-exports -----------------------------------------------------

pub use formkit_widgets::{
    ComponentBuilder, ComponentRegistry, DragPayload, DragSource, GridCells, RegistryBuilder,
    RegistryError, UIComponent, catalog,
};

// --- Runtime re-exports ----------------------------------------------------

pub use formkit_runtime::{
    Action, ActionHistory, ChangeDetector, Document, DropResult, DropTarget, EditorError,
    EditorHistory, EditorService, ExportSink, HistoryError, MemorySink, NodeDropTarget,
    PersistenceError,
};

// --- Errors ---------------------------------------------------------------

/// Any error raised by the formkit crates.
#[derive(Debug)]
pub enum Error {
    Tree(TreeError),
    Template(TemplateError),
    Registry(RegistryError),
    Editor(EditorError),
    History(HistoryError),
    Persistence(PersistenceError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Template(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Editor(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Template(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Editor(err) => Some(err),
            Self::History(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Self {
        Self::Template(err)
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<EditorError> for Error {
    fn from(err: EditorError) -> Self {
        Self::Editor(err)
    }
}

impl From<HistoryError> for Error {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

/// Standard result type for formkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Binding, ComponentRegistry, DragPayload, DragSource, DropTarget, EditorHistory,
        EditorService, Error, ModelNode, ModelTree, NodeDropTarget, NodeId, Properties,
        PropertiesMut, RenderMode, Result, Value, catalog,
    };
    pub use crate::{core, runtime, template, widgets};
}

pub use formkit_core as core;
pub use formkit_runtime as runtime;
pub use formkit_template as template;
pub use formkit_widgets as widgets;
