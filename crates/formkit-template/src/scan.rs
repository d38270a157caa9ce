#![forbid(unsafe_code)]

//! Template scanner.
//!
//! A template is literal text interspersed with `$...$` directives:
//!
//! | Directive | Meaning |
//! |-----------|---------|
//! | `$$` | a literal `$` |
//! | `$attr=prop$` | `attr="<value of prop>"` |
//! | `$attr?=prop$` | same, omitted when the value is empty |
//! | `$attr={prop}$` | braced binding: expressions render inside interpolation markers |
//! | `$prop$`, `$prop?$`, `${prop}$` | the value of `prop` in content position |
//! | `$"text"$` | literal text |
//! | `$#children$` | the rendered children of the node |
//!
//! Any directive may carry a mode prefix `e:` / `r:` (case-insensitive) that
//! restricts it to edit or run rendering.

use crate::RenderMode;
use crate::error::TemplateError;

/// Reserved content reference that expands to a node's children.
pub const CHILDREN: &str = "#children";

/// One scanned piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Directive(Directive),
}

/// A `$...$` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Byte offset of the opening `$`.
    pub position: usize,
    /// Restricts the directive to one render mode.
    pub mode: Option<RenderMode>,
    pub kind: DirectiveKind,
}

impl Directive {
    /// Whether the directive contributes output when rendering in `mode`.
    #[must_use]
    pub fn applies_to(&self, mode: RenderMode) -> bool {
        self.mode.is_none_or(|m| m == mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `attribute[?]=property` or `attribute[?]={property}`.
    Assignment {
        attribute: String,
        property: String,
        optional: bool,
        braced: bool,
    },
    /// `property[?]` or `{property}` in content position.
    Reference {
        property: String,
        optional: bool,
        braced: bool,
    },
    /// `"text"`.
    Literal(String),
    /// `#children`.
    Children,
}

/// Split a template into text and directive tokens.
///
/// Adjacent text pieces (including `$$` escapes) are merged.
pub fn scan(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut start = 0;

    while let Some(offset) = source[start..].find('$') {
        let open = start + offset;
        text.push_str(&source[start..open]);

        let Some(len) = source[open + 1..].find('$') else {
            return Err(TemplateError::UnterminatedDirective { position: open });
        };
        let close = open + 1 + len;
        start = close + 1;

        if len == 0 {
            text.push('$');
            continue;
        }

        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        let directive = parse_directive(&source[open + 1..close], open)?;
        tokens.push(Token::Directive(directive));
    }

    text.push_str(&source[start..]);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

fn parse_directive(expression: &str, position: usize) -> Result<Directive, TemplateError> {
    match expression.find('=') {
        Some(eq) if eq > 0 => parse_assignment(&expression[..eq], &expression[eq + 1..], position),
        _ => parse_reference(expression, position),
    }
}

fn parse_assignment(name: &str, value: &str, position: usize) -> Result<Directive, TemplateError> {
    let (name, optional) = strip_optional(name);
    let (mode, attribute) = split_mode(name, position)?;
    let (property, braced) = strip_braces(value);
    Ok(Directive {
        position,
        mode,
        kind: DirectiveKind::Assignment {
            attribute: attribute.to_string(),
            property: property.to_string(),
            optional,
            braced,
        },
    })
}

fn parse_reference(expression: &str, position: usize) -> Result<Directive, TemplateError> {
    let (mode, expression) = split_mode(expression, position)?;

    if let Some(rest) = expression.strip_prefix('"') {
        let Some(text) = rest.strip_suffix('"') else {
            return Err(TemplateError::UnclosedLiteral { position });
        };
        return Ok(Directive {
            position,
            mode,
            kind: DirectiveKind::Literal(text.to_string()),
        });
    }

    let (expression, optional) = strip_optional(expression);
    let (property, braced) = strip_braces(expression);
    let kind = if property == CHILDREN {
        DirectiveKind::Children
    } else {
        DirectiveKind::Reference {
            property: property.to_string(),
            optional,
            braced,
        }
    };
    Ok(Directive {
        position,
        mode,
        kind,
    })
}

fn strip_optional(name: &str) -> (&str, bool) {
    match name.strip_suffix('?') {
        Some(rest) => (rest, true),
        None => (name, false),
    }
}

fn strip_braces(name: &str) -> (&str, bool) {
    match name.strip_prefix('{').and_then(|n| n.strip_suffix('}')) {
        Some(inner) => (inner, true),
        None => (name, false),
    }
}

/// Split an `x:` mode prefix off `name`.
fn split_mode(name: &str, position: usize) -> Result<(Option<RenderMode>, &str), TemplateError> {
    let bytes = name.as_bytes();
    if bytes.get(1) != Some(&b':') {
        return Ok((None, name));
    }
    let mode = match bytes[0] {
        b'e' | b'E' => RenderMode::Edit,
        b'r' | b'R' => RenderMode::Run,
        other => {
            return Err(TemplateError::UnknownMode {
                mode: char::from(other),
                position,
            });
        }
    };
    Ok((Some(mode), &name[2..]))
}
