#![forbid(unsafe_code)]

//! Structural deep comparison with per-leaf difference records.

use std::fmt;

use crate::value::Value;

/// One mismatched leaf found by [`deep_compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// Dotted path of the leaf, e.g. `font.size` or `options.2`.
    pub path: String,
    /// Left-hand value at the path; `None` when absent.
    pub left: Option<Value>,
    /// Right-hand value at the path; `None` when absent.
    pub right: Option<Value>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(v) => format!("{v:?}"),
            None => "undefined".to_string(),
        };
        write!(f, "{}: {} != {}", self.path, show(&self.left), show(&self.right))
    }
}

/// Join a path segment onto a parent path.
#[must_use]
pub fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn mismatch(path: &str, left: Option<&Value>, right: Option<&Value>, diffs: &mut Vec<Difference>) {
    diffs.push(Difference {
        path: path.to_string(),
        left: left.cloned(),
        right: right.cloned(),
    });
}

/// Compare two optional values, appending one [`Difference`] per mismatched leaf.
///
/// Returns `true` when no difference was found. Two `NaN`s are equal. Lists
/// compare the union of their indices; records compare keys present only on
/// the left, then shared keys, then keys present only on the right. Values of
/// different shapes are one mismatch at the current path.
pub fn deep_compare(
    left: Option<&Value>,
    right: Option<&Value>,
    path: &str,
    diffs: &mut Vec<Difference>,
) -> bool {
    let before = diffs.len();
    compare_into(left, right, path, diffs);
    let found = diffs.len() - before;
    if found > 0 {
        tracing::trace!(path, differences = found, "values differ");
    }
    found == 0
}

fn compare_into(left: Option<&Value>, right: Option<&Value>, path: &str, diffs: &mut Vec<Difference>) {
    let (l, r) = match (left, right) {
        (None, None) => return,
        (Some(l), Some(r)) => (l, r),
        _ => return mismatch(path, left, right, diffs),
    };
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => {
            if !(a == b || (a.is_nan() && b.is_nan())) {
                mismatch(path, left, right, diffs);
            }
        }
        (Value::List(a), Value::List(b)) => {
            for i in 0..a.len().max(b.len()) {
                let segment = i.to_string();
                compare_into(a.get(i), b.get(i), &child_path(path, &segment), diffs);
            }
        }
        (Value::Record(a), Value::Record(b)) => {
            let left_only = a.keys().filter(|k| !b.contains_key(*k));
            let common = a.keys().filter(|k| b.contains_key(*k));
            let right_only = b.keys().filter(|k| !a.contains_key(*k));
            for key in left_only.chain(common).chain(right_only) {
                compare_into(a.get(key), b.get(key), &child_path(path, key), diffs);
            }
        }
        (Value::Binding(a), Value::Binding(b)) => {
            if a.kind != b.kind {
                let kind = child_path(path, "kind");
                diffs.push(Difference {
                    path: kind,
                    left: Some(Value::from(a.kind.as_str())),
                    right: Some(Value::from(b.kind.as_str())),
                });
            }
            compare_into(Some(&a.value), Some(&b.value), &child_path(path, "value"), diffs);
        }
        (a, b) => {
            if a != b {
                mismatch(path, left, right, diffs);
            }
        }
    }
}
