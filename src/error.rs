// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Reasons a deep clone was abandoned.
///
/// Any of these aborts the whole top-level call; no partially built graph is
/// ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloneError {
    /// The container's concrete type has no way to produce an empty instance.
    #[error("container type `{type_name}` is not supported: {reason}")]
    UnsupportedContainerType { type_name: String, reason: String },
    /// The record type declares neither a constructor nor zeroed construction.
    #[error("record type `{type_name}` exposes no construction path")]
    NoConstructionPath { type_name: String },
    /// The selected constructor rejected its default arguments.
    #[error("constructor of `{type_name}` failed: {reason}")]
    ConstructorFailed { type_name: String, reason: String },
    /// A field could not be read from the original or written into the copy.
    #[error("failed to copy field `{field}` of `{type_name}`: {reason}")]
    FieldCopyFailed {
        type_name: String,
        field: String,
        reason: String,
    },
    /// The container is mutably borrowed elsewhere and cannot be read.
    #[error("container `{type_name}` is already mutably borrowed")]
    ContainerBorrowed { type_name: String },
    #[error("clone depth exceeded limit of {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("clone exceeded limit of {limit} nodes")]
    NodeLimitExceeded { limit: usize },
}

impl CloneError {
    /// Name of the type that caused the failure, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedContainerType { type_name, .. }
            | Self::NoConstructionPath { type_name }
            | Self::ConstructorFailed { type_name, .. }
            | Self::FieldCopyFailed { type_name, .. }
            | Self::ContainerBorrowed { type_name } => Some(type_name),
            Self::DepthLimitExceeded { .. } | Self::NodeLimitExceeded { .. } => None,
        }
    }
}
