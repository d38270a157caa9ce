//! Property-based invariant tests for the undo log and change detection.
//!
//! 1. Undoing an action restores the exact tree it was applied to.
//! 2. Reverting the whole log restores the starting tree.
//! 3. A failed action leaves the tree untouched and is not recorded.
//! 4. A change detector never reports the same change twice.
//! 5. A change detector reports a change exactly when a tracked value moved.

use std::collections::BTreeMap;
use std::sync::Arc;

use formkit_core::model::{ModelNode, ModelTree, NodeId, PropertiesMut};
use formkit_core::value::Value;
use formkit_runtime::{Action, ActionHistory, ChangeDetector, EditorService};
use formkit_widgets::catalog;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const NODES: u32 = 8;

fn editor() -> EditorService {
    EditorService::new(Arc::new(catalog::standard().expect("standard catalog")))
}

/// 0 > [1, 2 > [4, 5], 3]; 6 and 7 detached. Odd nodes are leaves with no
/// child list; even nodes are containers.
fn start_tree() -> ModelTree {
    let mut tree = ModelTree::new();
    let ids: Vec<NodeId> = (0..NODES)
        .map(|i| {
            let node = if i % 2 == 0 {
                ModelNode::container("div")
            } else {
                ModelNode::new("label")
            };
            tree.insert(node)
        })
        .collect();
    for (parent, child) in [(0, 1), (0, 2), (0, 3), (2, 4), (2, 5)] {
        tree.append_child(ids[parent], ids[child]).expect("fixture");
    }
    tree
}

#[derive(Debug, Clone)]
enum Op {
    Reparent(u32, Option<u32>),
    Reorder(u32, usize, usize),
    Create(u32, u32),
    Delete(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let node = 0..NODES;
    prop_oneof![
        (node.clone(), proptest::option::of(node.clone())).prop_map(|(a, b)| Op::Reparent(a, b)),
        (node.clone(), 0..4usize, 0..4usize).prop_map(|(p, a, b)| Op::Reorder(p, a, b)),
        (node.clone(), node.clone()).prop_map(|(a, b)| Op::Create(a, b)),
        node.prop_map(Op::Delete),
    ]
}

fn to_action(op: &Op) -> Action {
    let id = NodeId::from_raw;
    match *op {
        Op::Reparent(node, parent) => Action::reparent(id(node), parent.map(id)),
        Op::Reorder(parent, a, b) => Action::reorder_child(id(parent), a, b),
        Op::Create(node, parent) => Action::create(id(node), id(parent)),
        Op::Delete(node) => Action::delete(id(node)),
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Undo
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_is_the_inverse_of_push(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let editor = editor();
        let mut tree = start_tree();
        let mut history = ActionHistory::new();
        let mut before_each = Vec::new();

        for op in &ops {
            let before = tree.clone();
            match history.push(&mut tree, "op", to_action(op)) {
                Ok(_) => before_each.push(before),
                Err(_) => prop_assert_eq!(&tree, &before),
            }
        }
        prop_assert_eq!(history.len(), before_each.len());

        while let Some(expected) = before_each.pop() {
            prop_assert!(history.undo(&mut tree, &editor).unwrap());
            prop_assert_eq!(&tree, &expected);
        }
        prop_assert!(!history.is_dirty());
    }

    #[test]
    fn revert_restores_the_starting_tree(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let editor = editor();
        let start = start_tree();
        let mut tree = start.clone();
        let mut history = ActionHistory::new();
        for op in &ops {
            let _ = history.push(&mut tree, "op", to_action(op));
        }
        let recorded = history.len();
        prop_assert_eq!(history.revert(&mut tree, &editor).unwrap(), recorded);
        prop_assert_eq!(tree, start);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Change detection
// ═════════════════════════════════════════════════════════════════════════

const TRACKED: [&str; 2] = ["name", "class"];

proptest! {
    #[test]
    fn detector_reports_each_change_once(
        edits in prop::collection::vec((0..TRACKED.len(), proptest::option::of("[a-c]{0,2}")), 1..20)
    ) {
        let registry = catalog::standard().unwrap();
        let mut node = ModelNode::new("label");
        let mut detector = ChangeDetector::for_component(registry.component("label").unwrap(), &node);
        let mut model: BTreeMap<&str, Option<Value>> = TRACKED.iter().map(|&k| (k, None)).collect();

        for (index, edit) in edits {
            let name = TRACKED[index];
            let next = edit.map(Value::from);
            let moved = model[name] != next;
            match &next {
                Some(value) => { node.set_value(name, value.clone()); }
                None => { node.remove_value(name); }
            }
            model.insert(name, next);

            prop_assert_eq!(detector.check(&node), moved);
            prop_assert!(!detector.check(&node));
        }
    }
}
