#![forbid(unsafe_code)]

use std::fmt;

/// Error raised while scanning or compiling a template.
///
/// Positions are byte offsets of the opening `$` of the offending directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `$` without a matching closing `$`.
    UnterminatedDirective { position: usize },
    /// A mode prefix other than `e:`/`E:`/`r:`/`R:`.
    UnknownMode { mode: char, position: usize },
    /// A `"literal"` directive without its closing quote.
    UnclosedLiteral { position: usize },
    /// A directive referencing a property the component does not have.
    UnknownProperty { name: String, position: usize },
}

impl TemplateError {
    /// Byte offset of the directive that failed.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::UnterminatedDirective { position }
            | Self::UnknownMode { position, .. }
            | Self::UnclosedLiteral { position }
            | Self::UnknownProperty { position, .. } => *position,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedDirective { position } => {
                write!(f, "unterminated directive at byte {position}: missing closing '$'")
            }
            Self::UnknownMode { mode, position } => {
                write!(f, "unsupported mode '{mode}' at byte {position}")
            }
            Self::UnclosedLiteral { position } => {
                write!(f, "expected closing '\"' in literal at byte {position}")
            }
            Self::UnknownProperty { name, position } => {
                write!(f, "unknown property '{name}' referenced at byte {position}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}
