#![forbid(unsafe_code)]

use std::fmt;

use formkit_template::{RenderMode, TemplateConfigError, TemplateError};

/// Catalog configuration and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two components were registered under the same id.
    DuplicateComponent { id: String },
    /// Two distinct properties with the same name ended up on one component.
    DuplicateProperty { component: String, property: String },
    /// An `inherits` entry names a component that was never registered.
    UnknownParent { component: String, parent: String },
    /// The inheritance graph loops; `chain` lists the ids around the cycle.
    CyclicInheritance { chain: Vec<String> },
    /// A component template failed to compile.
    Template {
        component: String,
        mode: RenderMode,
        source: TemplateError,
    },
    /// The template configuration handed to the builder does not validate.
    InvalidConfig { errors: Vec<TemplateConfigError> },
    UnknownComponent { id: String },
    UnknownProperty { component: String, property: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateComponent { id } => write!(f, "component '{id}' registered twice"),
            Self::DuplicateProperty {
                component,
                property,
            } => write!(f, "component '{component}' has two properties named '{property}'"),
            Self::UnknownParent { component, parent } => {
                write!(f, "component '{component}' inherits from unknown component '{parent}'")
            }
            Self::CyclicInheritance { chain } => {
                write!(f, "cyclic inheritance: {}", chain.join(" -> "))
            }
            Self::Template {
                component,
                mode,
                source,
            } => write!(f, "{mode} template of component '{component}': {source}"),
            Self::InvalidConfig { errors } => {
                f.write_str("invalid template config:")?;
                for error in errors {
                    write!(f, " {error}")?;
                }
                Ok(())
            }
            Self::UnknownComponent { id } => write!(f, "unknown component '{id}'"),
            Self::UnknownProperty {
                component,
                property,
            } => write!(f, "unknown property '{property}' on component '{component}'"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template { source, .. } => Some(source),
            Self::InvalidConfig { errors } => errors.first().map(|e| e as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}
