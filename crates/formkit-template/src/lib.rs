#![forbid(unsafe_code)]

//! Component template mini-language.
//!
//! Templates are scanned into [`scan::Token`]s, compiled once per
//! [`RenderMode`] into a [`CompiledTemplate`] of literal and evaluator
//! fragments, and rendered many times against a [`RenderScope`].
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use formkit_core::model::{ModelNode, ModelTree, NodeId};
//! use formkit_core::property::{Property, PropertyType};
//! use formkit_template::{CompiledTemplate, RenderHost, RenderMode, RenderScope, TemplateConfig};
//!
//! struct NoChildren;
//! impl RenderHost for NoChildren {
//!     fn render_node(&self, _: &ModelTree, _: NodeId, _: RenderMode) -> String {
//!         String::new()
//!     }
//! }
//!
//! let props = vec![Property::builder("placeholder").ty(PropertyType::String).default_value("").shared()];
//! let template = CompiledTemplate::compile(
//!     "<input $placeholder?=placeholder$/>",
//!     RenderMode::Run,
//!     &props,
//!     &TemplateConfig::default(),
//! )
//! .unwrap();
//!
//! let mut tree = ModelTree::new();
//! let id = tree.insert(ModelNode::new("input"));
//! let scope = RenderScope::new(&tree, id, &NoChildren).unwrap();
//! assert_eq!(template.render(&scope), "<input />");
//! ```

use std::fmt;

pub mod compile;
pub mod config;
pub mod error;
pub mod scan;

pub use compile::{CompiledTemplate, Evaluator, Fragment, PropertyLookup, RenderHost, RenderScope};
pub use config::{TemplateConfig, TemplateConfigError, TemplateConfigParse};
pub use error::TemplateError;
pub use scan::{Directive, DirectiveKind, Token, scan};

/// Which of a component's two markup forms to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Markup shown on the design canvas. Expressions are never shown.
    Edit,
    /// Markup handed to the runtime host. Expressions are interpolated.
    Run,
}

impl RenderMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Run => "run",
        }
    }

    #[must_use]
    pub const fn is_edit(self) -> bool {
        matches!(self, Self::Edit)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
