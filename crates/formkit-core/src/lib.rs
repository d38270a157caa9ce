#![forbid(unsafe_code)]

//! Core data model for the formkit UI builder.
//!
//! This crate holds everything the other layers share:
//!
//! - [`value`]: the dynamic [`Value`] stored in node fields, including the
//!   value-or-expression [`Binding`] wrapper.
//! - [`types`]: [`TypeDescriptor`]s and [`Constraint`]s that validate values.
//! - [`property`]: [`Property`] descriptors with defaults and comparison.
//! - [`compare`]: structural deep comparison with difference records.
//! - [`model`]: the arena-backed [`ModelTree`] of live nodes.
//! - [`document`]: the detached, serialisable [`NodeDocument`] form.

pub mod compare;
pub mod document;
pub mod model;
pub mod property;
pub mod types;
pub mod value;

pub use compare::{Difference, deep_compare};
pub use document::NodeDocument;
pub use model::{ModelNode, ModelTree, NodeId, Properties, PropertiesMut, TreeError};
pub use property::{DefaultValue, Property, PropertyBuilder, PropertyType, RenderFn};
pub use types::{Constraint, PrimitiveType, TypeDescriptor, TypeParseError};
pub use value::{Binding, BindingKind, Value};
