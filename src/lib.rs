// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod container;
mod engine;
mod error;
pub mod graph;
mod limits;
mod memo;
mod number;
mod record;
mod value;

pub(crate) use std::rc::Rc;

pub use container::{
    Container, ContainerKind, CustomContainer, Elements, Entry, Frozen, FrozenElements, Shape,
};
pub use engine::Cloner;
pub use error::CloneError;
pub use limits::CloneLimits;
pub use memo::IdentityMemo;
pub use number::Number;
pub use record::{Constructor, FieldDef, FieldType, Record, RecordType, RecordTypeBuilder};
pub use value::{Category, Value};

/// Deep clones `root` with default limits.
///
/// See [`Cloner::deep_clone`].
pub fn deep_clone(root: &Value) -> Result<Value, CloneError> {
    Cloner::new().deep_clone(root)
}
