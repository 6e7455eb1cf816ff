// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use std::collections::HashMap;

/// Maps original nodes, by identity, to the copies produced for them during
/// one top-level clone.
///
/// A copy is recorded before its contents are filled in, so a walk that
/// reaches the same original again (through a cycle or a second path) gets
/// the partially built copy back instead of recursing.
#[derive(Default)]
pub struct IdentityMemo {
    // The original is kept alive so its address cannot be reused while the
    // memo exists.
    clones: HashMap<usize, (Value, Value)>,
}

impl IdentityMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, original: &Value) -> Option<Value> {
        let id = original.node_id()?;
        self.clones.get(&id).map(|(_, copy)| copy.clone())
    }

    /// Registers `copy` for `original`. Plain values have no identity and are
    /// ignored.
    pub fn record(&mut self, original: &Value, copy: Value) {
        if let Some(id) = original.node_id() {
            self.clones.insert(id, (original.clone(), copy));
        }
    }

    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}
