// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Whole-graph inspection: structural comparison and reachability.

use crate::container::{ContainerKind, Entry};
use crate::value::Value;
use crate::Rc;

use std::collections::{HashMap, HashSet};

/// Calls `visit` once for every distinct reference node reachable from
/// `root`, including `root` itself. Plain values are not visited.
pub fn visit_nodes(root: &Value, mut visit: impl FnMut(&Value)) {
    let mut seen = HashSet::new();
    let mut stack = vec![root.clone()];
    while let Some(v) = stack.pop() {
        let Some(id) = v.node_id() else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        visit(&v);
        stack.extend(children(&v));
    }
}

fn children(v: &Value) -> Vec<Value> {
    let entries = match v {
        Value::Container(c) => match c.try_borrow() {
            Some(elements) => elements.entries(),
            None => vec![],
        },
        Value::Frozen(f) => f.entries(),
        Value::Record(r) => return r.try_slots().unwrap_or_default(),
        _ => return vec![],
    };
    let mut values = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Entry::Element(e) => values.push(e),
            Entry::Pair(k, v) => {
                values.push(k);
                values.push(v);
            }
        }
    }
    values
}

fn is_mutable(v: &Value) -> bool {
    match v {
        Value::Container(_) => true,
        Value::Record(r) => !r.record_type().is_immutable(),
        _ => false,
    }
}

/// Number of distinct containers and records reachable from `root`.
pub fn reachable_nodes(root: &Value) -> usize {
    let mut count = 0;
    visit_nodes(root, |_| count += 1);
    count
}

/// Whether some mutable container or record is reachable from both values.
pub fn shares_mutable_state(a: &Value, b: &Value) -> bool {
    let mut left = HashSet::new();
    visit_nodes(a, |v| {
        if is_mutable(v) {
            left.extend(v.node_id());
        }
    });
    let mut shared = false;
    visit_nodes(b, |v| {
        if is_mutable(v) && v.node_id().is_some_and(|id| left.contains(&id)) {
            shared = true;
        }
    });
    shared
}

/// Structural equality of two graphs up to node identity.
///
/// Plain values must be equal. Reference nodes must have the same concrete
/// kind (and record type) and must correspond one-to-one, so two paths that
/// reach one node in `a` must reach one node in `b` as well. Records are
/// compared on their copyable fields only. Unordered containers are matched
/// greedily.
pub fn isomorphic(a: &Value, b: &Value) -> bool {
    Matcher::default().matches(a, b)
}

#[derive(Default, Clone)]
struct Matcher {
    forward: HashMap<usize, usize>,
    backward: HashMap<usize, usize>,
}

impl Matcher {
    fn matches(&mut self, a: &Value, b: &Value) -> bool {
        match (a.node_id(), b.node_id()) {
            (None, None) => return a == b,
            (Some(x), Some(y)) => {
                match (self.forward.get(&x), self.backward.contains_key(&y)) {
                    (Some(&mapped), _) => return mapped == y,
                    (None, true) => return false,
                    (None, false) => {}
                }
                self.forward.insert(x, y);
                self.backward.insert(y, x);
            }
            _ => return false,
        }

        match (a, b) {
            (Value::Container(x), Value::Container(y)) => {
                if x.kind() != y.kind() {
                    return false;
                }
                let (Some(xs), Some(ys)) = (x.try_borrow(), y.try_borrow()) else {
                    return false;
                };
                let (xs, ys) = (xs.entries(), ys.entries());
                if is_ordered(x.kind()) {
                    self.ordered(&xs, &ys)
                } else {
                    self.unordered(&xs, &ys)
                }
            }
            (Value::Frozen(x), Value::Frozen(y)) => {
                x.shape() == y.shape() && self.ordered(&x.entries(), &y.entries())
            }
            (Value::Record(x), Value::Record(y)) => {
                let ty = x.record_type();
                if !Rc::ptr_eq(ty, y.record_type()) {
                    return false;
                }
                let (Some(xs), Some(ys)) = (x.try_slots(), y.try_slots()) else {
                    return false;
                };
                ty.copyable_fields()
                    .iter()
                    .all(|&i| self.matches(&xs[i], &ys[i]))
            }
            _ => false,
        }
    }

    fn entry(&mut self, a: &Entry, b: &Entry) -> bool {
        match (a, b) {
            (Entry::Element(x), Entry::Element(y)) => self.matches(x, y),
            (Entry::Pair(xk, xv), Entry::Pair(yk, yv)) => {
                self.matches(xk, yk) && self.matches(xv, yv)
            }
            _ => false,
        }
    }

    fn ordered(&mut self, xs: &[Entry], ys: &[Entry]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.entry(x, y))
    }

    fn unordered(&mut self, xs: &[Entry], ys: &[Entry]) -> bool {
        if xs.len() != ys.len() {
            return false;
        }
        let mut used = vec![false; ys.len()];
        for x in xs {
            let mut found = false;
            for (i, y) in ys.iter().enumerate() {
                if used[i] || !same_plain_key(x, y) {
                    continue;
                }
                let saved = self.clone();
                if self.entry(x, y) {
                    used[i] = true;
                    found = true;
                    break;
                }
                *self = saved;
            }
            if !found {
                return false;
            }
        }
        true
    }
}

// Cheap pre-filter: plain keys must be equal, reference keys may match.
fn same_plain_key(a: &Entry, b: &Entry) -> bool {
    let key = |e: &Entry| match e {
        Entry::Element(k) | Entry::Pair(k, _) => k.clone(),
    };
    let (ka, kb) = (key(a), key(b));
    match (ka.node_id(), kb.node_id()) {
        (None, None) => ka == kb,
        (Some(_), Some(_)) => true,
        _ => false,
    }
}

fn is_ordered(kind: &ContainerKind) -> bool {
    !matches!(
        kind,
        ContainerKind::HashSet
            | ContainerKind::HashMap
            | ContainerKind::BTreeSet
            | ContainerKind::BTreeMap
    )
}
