#![forbid(unsafe_code)]

//! Component catalog for the formkit UI builder.
//!
//! - [`component`]: [`UIComponent`] descriptors and their fluent builder.
//! - [`registry`]: the [`RegistryBuilder`] that resolves inheritance and
//!   compiles templates, and the immutable [`ComponentRegistry`].
//! - [`drag`]: the [`DragSource`] contract used by the external drag layer.
//! - [`catalog`]: the standard set of components.
//!
//! # Example
//! ```
//! use formkit_core::model::{ModelNode, ModelTree};
//! use formkit_core::value::Binding;
//! use formkit_template::RenderMode;
//!
//! let registry = formkit_widgets::catalog::standard().unwrap();
//! let mut tree = ModelTree::new();
//! let id = tree.insert(ModelNode::new("h1").with_value("value", Binding::literal("Hello")));
//! assert_eq!(registry.render(&tree, id, RenderMode::Edit), "<h1 >Hello</h1>");
//! ```

pub mod catalog;
pub mod component;
pub mod drag;
pub mod error;
pub mod registry;

pub use catalog::GridCells;
pub use component::{ComponentBuilder, DecorateFn, Orientation, PropertyGroup, UIComponent};
pub use drag::{DragPayload, DragSource, DragSubject};
pub use error::RegistryError;
pub use registry::{ComponentRegistry, PaletteGroup, RegistryBuilder};
