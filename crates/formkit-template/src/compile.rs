#![forbid(unsafe_code)]

//! Compilation of scanned templates into fragment lists, and rendering.
//!
//! A template is compiled once per [`RenderMode`]. Directives restricted to
//! the other mode are dropped at compile time, property references are
//! resolved against the owning component, and adjacent literal text is
//! coalesced. Rendering folds the fragment list over a node.

use std::fmt;
use std::sync::Arc;

use formkit_core::model::{ModelNode, ModelTree, NodeId, Properties};
use formkit_core::property::Property;
use formkit_core::value::{Binding, BindingKind, Value};

use crate::RenderMode;
use crate::config::TemplateConfig;
use crate::error::TemplateError;
use crate::scan::{DirectiveKind, Token, scan};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Resolves property names referenced by a template.
pub trait PropertyLookup {
    fn lookup_property(&self, name: &str) -> Option<Arc<Property>>;
}

impl PropertyLookup for [Arc<Property>] {
    fn lookup_property(&self, name: &str) -> Option<Arc<Property>> {
        self.iter().rev().find(|p| p.name() == name).cloned()
    }
}

impl PropertyLookup for Vec<Arc<Property>> {
    fn lookup_property(&self, name: &str) -> Option<Arc<Property>> {
        self.as_slice().lookup_property(name)
    }
}

/// Renders arbitrary nodes; used to expand `$#children$` in run mode.
pub trait RenderHost {
    fn render_node(&self, tree: &ModelTree, id: NodeId, mode: RenderMode) -> String;
}

/// Explicit context handed to every evaluator fragment.
#[derive(Clone, Copy)]
pub struct RenderScope<'a> {
    pub tree: &'a ModelTree,
    pub id: NodeId,
    pub node: &'a ModelNode,
    pub host: &'a dyn RenderHost,
}

impl<'a> RenderScope<'a> {
    /// Scope for `id`, or `None` when the tree has no such node.
    #[must_use]
    pub fn new(tree: &'a ModelTree, id: NodeId, host: &'a dyn RenderHost) -> Option<Self> {
        let node = tree.get(id)?;
        Some(Self {
            tree,
            id,
            node,
            host,
        })
    }
}

impl fmt::Debug for RenderScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScope")
            .field("id", &self.id)
            .field("component", &self.node.component_id())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

pub type Evaluator = Box<dyn Fn(&RenderScope<'_>) -> String + Send + Sync>;

/// One element of a compiled template.
pub enum Fragment {
    Literal(String),
    Eval(Evaluator),
}

impl Fragment {
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    fn render_into(&self, scope: &RenderScope<'_>, out: &mut String) {
        match self {
            Self::Literal(text) => out.push_str(text),
            Self::Eval(eval) => out.push_str(&eval(scope)),
        }
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Eval(_) => f.write_str("Eval(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// CompiledTemplate
// ---------------------------------------------------------------------------

/// A template compiled for one render mode.
#[derive(Debug)]
pub struct CompiledTemplate {
    source: String,
    mode: RenderMode,
    fragments: Vec<Fragment>,
}

impl CompiledTemplate {
    /// Compile `source` for `mode`, resolving properties through `properties`.
    pub fn compile(
        source: &str,
        mode: RenderMode,
        properties: &dyn PropertyLookup,
        config: &TemplateConfig,
    ) -> Result<Self, TemplateError> {
        let mut builder = FragmentBuilder::default();

        for token in scan(source)? {
            let directive = match token {
                Token::Text(text) => {
                    builder.literal(&text);
                    continue;
                }
                Token::Directive(directive) => directive,
            };
            if !directive.applies_to(mode) {
                continue;
            }
            let position = directive.position;
            let resolve = |name: &str| {
                properties
                    .lookup_property(name)
                    .ok_or_else(|| TemplateError::UnknownProperty {
                        name: name.to_string(),
                        position,
                    })
            };
            match directive.kind {
                DirectiveKind::Literal(text) => builder.literal(&text),
                DirectiveKind::Children => match mode {
                    RenderMode::Edit => builder.literal(&config.children_placeholder),
                    RenderMode::Run => builder.eval(Box::new(render_children)),
                },
                DirectiveKind::Reference {
                    property, braced, ..
                } => {
                    let property = resolve(&property)?;
                    builder.eval(content_fragment(property, mode, braced, config));
                }
                DirectiveKind::Assignment {
                    attribute,
                    property,
                    optional,
                    braced,
                } => {
                    let property = resolve(&property)?;
                    builder.eval(assignment_fragment(
                        attribute, property, mode, optional, braced, config,
                    ));
                }
            }
        }

        let fragments = builder.finish();
        tracing::trace!(
            mode = %mode,
            fragments = fragments.len(),
            "template compiled"
        );
        Ok(Self {
            source: source.to_string(),
            mode,
            fragments,
        })
    }

    /// Concatenate all fragments evaluated against `scope`.
    #[must_use]
    pub fn render(&self, scope: &RenderScope<'_>) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            fragment.render_into(scope, &mut out);
        }
        out
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[derive(Default)]
struct FragmentBuilder {
    fragments: Vec<Fragment>,
}

impl FragmentBuilder {
    fn literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Fragment::Literal(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Literal(text.to_string()));
        }
    }

    fn eval(&mut self, eval: Evaluator) {
        self.fragments.push(Fragment::Eval(eval));
    }

    fn finish(self) -> Vec<Fragment> {
        self.fragments
    }
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

fn render_children(scope: &RenderScope<'_>) -> String {
    scope
        .tree
        .children(scope.id)
        .iter()
        .map(|&child| scope.host.render_node(scope.tree, child, RenderMode::Run))
        .collect()
}

/// Stored binding of a binding-capable property, falling back to its default.
/// A bare stored value is read as a literal.
fn resolve_binding(node: &ModelNode, property: &Property) -> Binding {
    let stored = node.value(property.name()).filter(|v| !v.is_null()).cloned();
    match stored.or_else(|| property.create_default()) {
        Some(Value::Binding(binding)) => binding,
        Some(other) => Binding::literal(other),
        None => Binding::literal(Value::Null),
    }
}

fn expression_text(binding: &Binding, braced: bool, config: &TemplateConfig) -> String {
    let expression = binding.inner().to_markup();
    if braced {
        config.interpolate(&expression)
    } else {
        expression
    }
}

fn content_fragment(
    property: Arc<Property>,
    mode: RenderMode,
    braced: bool,
    config: &TemplateConfig,
) -> Evaluator {
    if !property.allows_binding() {
        return Box::new(move |scope: &RenderScope<'_>| property.render(scope.node));
    }
    let config = config.clone();
    Box::new(move |scope: &RenderScope<'_>| {
        let binding = resolve_binding(scope.node, &property);
        match (binding.kind, mode) {
            (BindingKind::Value, _) => property.render_value(scope.node, Some(binding.inner())),
            (BindingKind::Binding, RenderMode::Edit) => String::new(),
            (BindingKind::Binding, RenderMode::Run) => expression_text(&binding, braced, &config),
        }
    })
}

fn assignment_fragment(
    attribute: String,
    property: Arc<Property>,
    mode: RenderMode,
    optional: bool,
    braced: bool,
    config: &TemplateConfig,
) -> Evaluator {
    let attr = move |value: &str| format!("{attribute}=\"{value}\"");

    if !property.allows_binding() {
        return Box::new(move |scope: &RenderScope<'_>| {
            let value = property.render(scope.node);
            if value.is_empty() && optional {
                String::new()
            } else {
                attr(&value)
            }
        });
    }

    let config = config.clone();
    Box::new(move |scope: &RenderScope<'_>| {
        let binding = resolve_binding(scope.node, &property);
        match (binding.kind, mode) {
            (BindingKind::Value, _) => {
                let value = property.render_value(scope.node, Some(binding.inner()));
                if value.is_empty() && optional {
                    String::new()
                } else {
                    attr(&value)
                }
            }
            (BindingKind::Binding, RenderMode::Edit) => {
                if optional {
                    String::new()
                } else {
                    attr("")
                }
            }
            (BindingKind::Binding, RenderMode::Run) => {
                attr(&expression_text(&binding, braced, &config))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_core::model::PropertiesMut;
    use formkit_core::property::PropertyType;

    struct Host;

    impl RenderHost for Host {
        fn render_node(&self, tree: &ModelTree, id: NodeId, _mode: RenderMode) -> String {
            tree[id].value("text").map(Value::to_markup).unwrap_or_default()
        }
    }

    fn props() -> Vec<Arc<Property>> {
        vec![
            Property::builder("name").ty(PropertyType::String).shared(),
            Property::builder("placeholder")
                .ty(PropertyType::String)
                .binding(true)
                .shared(),
            Property::builder("required")
                .ty(PropertyType::Boolean)
                .binding(true)
                .default_value(false)
                .shared(),
            Property::builder("rows")
                .ty(PropertyType::Number)
                .default_value(2)
                .shared(),
        ]
    }

    fn render(source: &str, mode: RenderMode, node: ModelNode) -> String {
        let template =
            CompiledTemplate::compile(source, mode, &props(), &TemplateConfig::default()).unwrap();
        let mut tree = ModelTree::new();
        let id = tree.insert(node);
        let scope = RenderScope::new(&tree, id, &Host).unwrap();
        template.render(&scope)
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    #[test]
    fn adjacent_literals_are_coalesced() {
        let t = CompiledTemplate::compile(
            r#"<a$$b$"c"$$r:"d"$>$name$</a>"#,
            RenderMode::Edit,
            &props(),
            &TemplateConfig::default(),
        )
        .unwrap();
        assert_eq!(t.len(), 3);
        assert!(matches!(&t.fragments()[0], Fragment::Literal(s) if s == "<a$bc>"));
        assert!(!t.fragments()[1].is_literal());
    }

    #[test]
    fn unknown_property_fails_at_compile_time() {
        let err = CompiledTemplate::compile(
            "<x $title=title$>",
            RenderMode::Run,
            &props(),
            &TemplateConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownProperty {
                name: "title".into(),
                position: 3
            }
        );
    }

    #[test]
    fn directives_of_other_mode_are_not_resolved() {
        let t = CompiledTemplate::compile(
            "$e:title$",
            RenderMode::Run,
            &props(),
            &TemplateConfig::default(),
        )
        .unwrap();
        assert!(t.is_empty());
    }

    // =========================================================================
    // Plain properties
    // =========================================================================

    #[test]
    fn plain_assignment_keeps_empty_attribute_unless_optional() {
        let node = ModelNode::new("input");
        assert_eq!(render("<i $name=name$>", RenderMode::Run, node.clone()), "<i name=\"\">");
        assert_eq!(render("<i $name?=name$>", RenderMode::Run, node), "<i >");
    }

    #[test]
    fn plain_content_uses_default() {
        assert_eq!(render("$rows$", RenderMode::Edit, ModelNode::new("t")), "2");
        assert_eq!(render("$name?$", RenderMode::Edit, ModelNode::new("t")), "");
    }

    // =========================================================================
    // Binding properties
    // =========================================================================

    #[test]
    fn literal_binding_renders_value_in_both_modes() {
        let node = ModelNode::new("input").with_value("placeholder", Binding::literal("Email"));
        for mode in [RenderMode::Edit, RenderMode::Run] {
            assert_eq!(
                render("$placeholder?=placeholder$", mode, node.clone()),
                "placeholder=\"Email\""
            );
        }
    }

    #[test]
    fn expression_binding_depends_on_mode_and_braces() {
        let mut node = ModelNode::new("input");
        node.set_value("placeholder", Value::Binding(Binding::expression("x.y")));
        assert_eq!(render("${placeholder}$", RenderMode::Edit, node.clone()), "");
        assert_eq!(render("${placeholder}$", RenderMode::Run, node.clone()), "{{x.y}}");
        assert_eq!(render("$placeholder$", RenderMode::Run, node.clone()), "x.y");
        assert_eq!(
            render("$p={placeholder}$", RenderMode::Run, node.clone()),
            "p=\"{{x.y}}\""
        );
        assert_eq!(render("$p=placeholder$", RenderMode::Edit, node.clone()), "p=\"\"");
        assert_eq!(render("$p?=placeholder$", RenderMode::Edit, node), "");
    }

    #[test]
    fn binding_default_is_used_when_unset() {
        let node = ModelNode::new("input");
        assert_eq!(
            render("$r:[required]=required$", RenderMode::Run, node),
            "[required]=\"false\""
        );
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[test]
    fn children_expand_per_mode() {
        let config = TemplateConfig::default();
        let mut tree = ModelTree::new();
        let root = tree.insert(ModelNode::container("div"));
        for text in ["A", "B"] {
            let child = tree.insert(ModelNode::new("p").with_value("text", text));
            tree.append_child(root, child).unwrap();
        }
        let scope = RenderScope::new(&tree, root, &Host).unwrap();

        let run = CompiledTemplate::compile("<div>$#children$</div>", RenderMode::Run, &props(), &config)
            .unwrap();
        assert_eq!(run.render(&scope), "<div>AB</div>");

        let edit =
            CompiledTemplate::compile("<div>$#children$</div>", RenderMode::Edit, &props(), &config)
                .unwrap();
        assert_eq!(edit.len(), 1);
        assert_eq!(
            edit.render(&scope),
            format!("<div>{}</div>", config.children_placeholder)
        );
    }
}
