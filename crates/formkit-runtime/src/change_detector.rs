#![forbid(unsafe_code)]

//! Snapshot-based change detection for a single node.
//!
//! A [`ChangeDetector`] holds a list of checks, each remembering the last
//! value it saw. [`check`](ChangeDetector::check) compares every check
//! against the live node *and* adopts the live value as the new snapshot, so
//! one call both detects and commits. All checks run on every call.
//!
//! - scalar checks compare the raw stored value;
//! - composite checks compare the named sub-fields of a record or binding;
//! - the children check compares the child id list entry by entry.
//!
//! Absent values snapshot as absent: a node that lacks a tracked field
//! reports no change until the field appears.

use formkit_core::model::{ModelNode, NodeId, Properties};
use formkit_core::value::Value;
use formkit_widgets::UIComponent;

#[derive(Debug, Clone, PartialEq)]
enum Check {
    Scalar {
        property: String,
        snapshot: Option<Value>,
    },
    Composite {
        property: String,
        fields: Vec<String>,
        snapshot: Option<Vec<Option<Value>>>,
    },
    Children {
        snapshot: Option<Vec<NodeId>>,
    },
}

fn present(node: &ModelNode, property: &str) -> Option<Value> {
    node.value(property).filter(|v| !v.is_null()).cloned()
}

fn composite_fields(value: &Value, fields: &[String]) -> Vec<Option<Value>> {
    fields.iter().map(|f| value.field(f)).collect()
}

impl Check {
    fn name(&self) -> &str {
        match self {
            Self::Scalar { property, .. } | Self::Composite { property, .. } => property,
            Self::Children { .. } => "children",
        }
    }

    fn take_snapshot(&mut self, node: &ModelNode) {
        match self {
            Self::Scalar { property, snapshot } => *snapshot = node.value(property).cloned(),
            Self::Composite {
                property,
                fields,
                snapshot,
            } => *snapshot = present(node, property).map(|v| composite_fields(&v, fields)),
            Self::Children { snapshot } => *snapshot = node.children().map(<[NodeId]>::to_vec),
        }
    }

    /// Compare against `node` and adopt its state. Returns whether it differed.
    fn diff(&mut self, node: &ModelNode) -> bool {
        match self {
            Self::Scalar { property, snapshot } => {
                let current = node.value(property).cloned();
                let changed = *snapshot != current;
                *snapshot = current;
                changed
            }
            Self::Composite {
                property,
                fields,
                snapshot,
            } => {
                let Some(value) = present(node, property) else {
                    return snapshot.take().is_some();
                };
                match snapshot {
                    Some(previous) => {
                        let mut changed = false;
                        for (slot, field) in previous.iter_mut().zip(fields.iter()) {
                            let current = value.field(field);
                            if *slot != current {
                                changed = true;
                            }
                            *slot = current;
                        }
                        changed
                    }
                    None => {
                        *snapshot = Some(composite_fields(&value, fields));
                        true
                    }
                }
            }
            Self::Children { snapshot } => {
                let current = node.children();
                let changed = snapshot.as_deref() != current;
                if changed {
                    *snapshot = current.map(<[NodeId]>::to_vec);
                }
                changed
            }
        }
    }
}

/// Tracks a fixed set of fields of one node between checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeDetector {
    checks: Vec<Check>,
}

impl ChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a property by value.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.checks.push(Check::Scalar {
            property: name.into(),
            snapshot: None,
        });
        self
    }

    /// Track the named sub-fields of a record-valued property.
    #[must_use]
    pub fn composite<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks.push(Check::Composite {
            property: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            snapshot: None,
        });
        self
    }

    /// Track the child list.
    #[must_use]
    pub fn children(mut self) -> Self {
        self.checks.push(Check::Children { snapshot: None });
        self
    }

    /// Detector for every user-facing property of `component` plus the
    /// child list, snapshotted against `node`.
    #[must_use]
    pub fn for_component(component: &UIComponent, node: &ModelNode) -> Self {
        let mut detector = Self::new();
        for property in component.properties().iter().filter(|p| !p.is_artificial()) {
            detector = match property.composite_fields() {
                Some(fields) => detector.composite(property.name(), fields.iter().cloned()),
                None => detector.property(property.name()),
            };
        }
        let mut detector = detector.children();
        detector.take_snapshot(node);
        detector
    }

    /// Remember the current state of every tracked field.
    pub fn take_snapshot(&mut self, node: &ModelNode) {
        for check in &mut self.checks {
            check.take_snapshot(node);
        }
    }

    /// Whether any tracked field differs from its snapshot. Every check
    /// adopts the live state, whether or not it differed.
    pub fn check(&mut self, node: &ModelNode) -> bool {
        let mut changed = false;
        for check in &mut self.checks {
            if check.diff(node) {
                tracing::trace!(property = check.name(), "change detected");
                changed = true;
            }
        }
        changed
    }

    /// Names of the tracked fields, in check order.
    pub fn tracked(&self) -> impl Iterator<Item = &str> + '_ {
        self.checks.iter().map(Check::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_core::model::{ModelTree, PropertiesMut};
    use formkit_core::value::Binding;

    fn detector(node: &ModelNode) -> ChangeDetector {
        let mut detector = ChangeDetector::new()
            .property("name")
            .composite("font", ["weight", "size"])
            .children();
        detector.take_snapshot(node);
        detector
    }

    // =========================================================================
    // Scalar
    // =========================================================================

    #[test]
    fn unchanged_node_reports_nothing_twice() {
        let node = ModelNode::container("label").with_value("name", "a");
        let mut detector = detector(&node);
        assert!(!detector.check(&node));
        assert!(!detector.check(&node));
    }

    #[test]
    fn one_mutation_reports_once() {
        let mut node = ModelNode::new("label").with_value("name", "a");
        let mut detector = detector(&node);
        node.set_value("name", Value::from("b"));
        assert!(detector.check(&node));
        assert!(!detector.check(&node));
    }

    #[test]
    fn nan_never_equals_its_snapshot() {
        let node = ModelNode::new("label").with_value("name", f64::NAN);
        let mut detector = detector(&node);
        assert!(detector.check(&node));
    }

    // =========================================================================
    // Composite
    // =========================================================================

    #[test]
    fn composite_tracks_named_fields_only() {
        let mut node = ModelNode::new("label").with_value(
            "font",
            Value::record([("weight", Value::from("bold")), ("color", Value::from("red"))]),
        );
        let mut detector = detector(&node);

        node.set_value(
            "font",
            Value::record([("weight", Value::from("bold")), ("color", Value::from("blue"))]),
        );
        assert!(!detector.check(&node));

        node.set_value("font", Value::record([("weight", Value::from("normal"))]));
        assert!(detector.check(&node));
        assert!(!detector.check(&node));
    }

    #[test]
    fn composite_appearing_and_disappearing() {
        let mut node = ModelNode::new("label");
        let mut detector = detector(&node);
        assert!(!detector.check(&node));

        node.set_value("font", Value::empty_record());
        assert!(detector.check(&node));
        assert!(!detector.check(&node));

        node.remove_value("font");
        assert!(detector.check(&node));
        assert!(!detector.check(&node));
    }

    #[test]
    fn binding_fields_are_composite() {
        let mut node = ModelNode::new("label").with_value("value", Binding::literal("x"));
        let mut detector = ChangeDetector::new().composite("value", ["kind", "value"]);
        detector.take_snapshot(&node);
        node.set_value("value", Value::Binding(Binding::expression("x")));
        assert!(detector.check(&node));
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[test]
    fn child_list_changes_are_detected() {
        let mut tree = ModelTree::new();
        let row = tree.insert(ModelNode::container("row"));
        let a = tree.insert(ModelNode::new("col"));
        let b = tree.insert(ModelNode::new("col"));
        let mut detector = detector(&tree[row]);

        tree.append_child(row, a).unwrap();
        assert!(detector.check(&tree[row]));
        tree.append_child(row, b).unwrap();
        assert!(detector.check(&tree[row]));
        tree.swap_children(row, 0, 1).unwrap();
        assert!(detector.check(&tree[row]));
        assert!(!detector.check(&tree[row]));
    }

    #[test]
    fn all_checks_commit_even_after_a_hit() {
        let mut node = ModelNode::new("label").with_value("name", "a");
        let mut detector = detector(&node);
        node.set_value("name", Value::from("b"));
        node.set_value("font", Value::record([("size", Value::from(12))]));
        assert!(detector.check(&node));
        assert!(!detector.check(&node));
    }

    #[test]
    fn tracked_names_in_order() {
        let detector = ChangeDetector::new().property("a").composite("b", ["x"]).children();
        assert_eq!(detector.tracked().collect::<Vec<_>>(), ["a", "b", "children"]);
        assert_eq!(detector.len(), 3);
    }
}
