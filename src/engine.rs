// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::container::{Container, Entry};
use crate::error::CloneError;
use crate::limits::CloneLimits;
use crate::memo::IdentityMemo;
use crate::record::Record;
use crate::value::{Category, Value};

use tracing::{debug, trace};

/// The deep clone engine.
///
/// Holds configuration only. Every call gets its own memo, so one `Cloner`
/// can serve any number of independent calls.
#[derive(Debug, Clone, Default)]
pub struct Cloner {
    limits: CloneLimits,
}

impl Cloner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: CloneLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &CloneLimits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: CloneLimits) {
        self.limits = limits;
    }

    /// Produces a copy of `root` that shares no mutable node with it.
    ///
    /// Plain values, frozen containers and records of immutable types are
    /// shared. Every other container and record is copied exactly once, so
    /// aliasing and cycles in the original reappear in the copy.
    pub fn deep_clone(&self, root: &Value) -> Result<Value, CloneError> {
        self.run(root.category(), |ctx| ctx.clone_value(root, 0))
    }

    /// Like [`Cloner::deep_clone`] for a record root. A record of an
    /// immutable type is returned as is.
    pub fn deep_clone_record(&self, root: &Record) -> Result<Record, CloneError> {
        if root.record_type().is_immutable() {
            return Ok(root.clone());
        }
        self.run(Category::Composite, |ctx| {
            ctx.admit(0)?;
            ctx.clone_record(root, 0)
        })
    }

    fn run<T>(
        &self,
        category: Category,
        clone: impl FnOnce(&mut CloneContext<'_>) -> Result<T, CloneError>,
    ) -> Result<T, CloneError> {
        let mut ctx = CloneContext::new(&self.limits);
        debug!(category = ?category, "deep clone started");
        match clone(&mut ctx) {
            Ok(copy) => {
                debug!(
                    copies = ctx.copies,
                    memo = ctx.memo.len(),
                    "deep clone finished"
                );
                Ok(copy)
            }
            Err(e) => {
                debug!(type_name = e.type_name(), error = %e, "deep clone failed");
                Err(e)
            }
        }
    }
}

/// State of a single top-level call.
struct CloneContext<'a> {
    memo: IdentityMemo,
    limits: &'a CloneLimits,
    copies: usize,
}

impl<'a> CloneContext<'a> {
    fn new(limits: &'a CloneLimits) -> Self {
        Self {
            memo: IdentityMemo::new(),
            limits,
            copies: 0,
        }
    }

    fn clone_value(&mut self, value: &Value, depth: usize) -> Result<Value, CloneError> {
        if matches!(value.category(), Category::Null | Category::ValueType) {
            return Ok(value.clone());
        }
        if value.is_shareable() {
            trace!(value = ?value, "shared");
            return Ok(value.clone());
        }
        if let Some(copy) = self.memo.lookup(value) {
            trace!(value = ?value, "memo hit");
            return Ok(copy);
        }
        self.admit(depth)?;

        match value {
            Value::Container(c) => self.clone_container(value, c, depth),
            Value::Record(r) => Ok(Value::Record(self.clone_record(r, depth)?)),
            // Everything else is shareable.
            _ => Ok(value.clone()),
        }
    }

    fn admit(&mut self, depth: usize) -> Result<(), CloneError> {
        if let Some(limit) = self.limits.max_depth {
            if depth > limit {
                return Err(CloneError::DepthLimitExceeded { limit });
            }
        }
        if let Some(limit) = self.limits.max_nodes {
            if self.copies >= limit {
                return Err(CloneError::NodeLimitExceeded { limit });
            }
        }
        self.copies += 1;
        Ok(())
    }

    fn clone_container(
        &mut self,
        original: &Value,
        container: &Container,
        depth: usize,
    ) -> Result<Value, CloneError> {
        let kind = container.kind();
        let busy = || CloneError::ContainerBorrowed {
            type_name: kind.name().into(),
        };

        let (empty, entries) = {
            let elements = container.try_borrow().ok_or_else(busy)?;
            let empty = elements
                .empty_like()
                .ok_or_else(|| CloneError::UnsupportedContainerType {
                    type_name: kind.name().into(),
                    reason: "no empty construction".into(),
                })?;
            (empty, elements.entries())
        };

        let copy = Container::new(empty);
        self.memo.record(original, Value::Container(copy.clone()));
        trace!(kind = kind.name(), len = entries.len(), "copying container");

        for entry in entries {
            let entry = match entry {
                Entry::Element(e) => Entry::Element(self.clone_value(&e, depth + 1)?),
                Entry::Pair(k, v) => Entry::Pair(
                    self.clone_value(&k, depth + 1)?,
                    self.clone_value(&v, depth + 1)?,
                ),
            };
            let inserted = copy.try_borrow_mut().ok_or_else(busy)?.insert(entry);
            if !inserted {
                return Err(CloneError::UnsupportedContainerType {
                    type_name: kind.name().into(),
                    reason: "empty instance has a different shape".into(),
                });
            }
        }

        Ok(Value::Container(copy))
    }

    fn clone_record(&mut self, record: &Record, depth: usize) -> Result<Record, CloneError> {
        let ty = record.record_type();
        let copy = ty.instantiate_blank()?;
        self.memo
            .record(&Value::Record(record.clone()), Value::Record(copy.clone()));
        trace!(type_name = ty.name(), "copying record");

        for &slot in ty.copyable_fields() {
            if ty.fields()[slot].is_opaque() {
                return Err(record.field_error(slot, "field is opaque"));
            }
            let value = record.read_slot(slot)?;
            let value = self.clone_value(&value, depth + 1)?;
            copy.write_slot(slot, value)?;
        }

        Ok(copy)
    }
}
