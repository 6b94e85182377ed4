//! Recursive key search over heterogeneous JSON trees

use std::fmt;

use serde_json::Value;

/// One step on the path from the root of a tree to a matched key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Ordered sequence of segments leading from the root to a matched key.
pub type KeyPath = Vec<PathSegment>;

/// Finds every occurrence of `key` in a tree of nested mappings and
/// sequences, returning each match's path together with its value.
///
/// Traversal is depth-first: mapping entries in insertion order, then
/// sequence elements in index order. A matched value is descended into as
/// well, so a key recurring below a match is reported again. Scalars are
/// ignored and the search never fails, whatever shape the tree has.
pub fn find_keys<'a>(root: &'a Value, key: &str) -> Vec<(KeyPath, &'a Value)> {
    let mut results = Vec::new();
    let mut path = KeyPath::new();
    collect(root, key, &mut path, &mut results);
    results
}

fn collect<'a>(
    node: &'a Value,
    key: &str,
    path: &mut KeyPath,
    results: &mut Vec<(KeyPath, &'a Value)>,
) {
    match node {
        Value::Object(map) => {
            for (name, value) in map {
                path.push(PathSegment::Key(name.clone()));
                if name == key {
                    results.push((path.clone(), value));
                }
                collect(value, key, path, results);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                collect(item, key, path, results);
                path.pop();
            }
        }
        _ => {}
    }
}
