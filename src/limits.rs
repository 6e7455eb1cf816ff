// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resource ceilings for a single clone call.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Optional bounds on how far and how much one call may copy.
///
/// Depth counts nested container and record levels below the root (the root
/// itself is depth 0). The node budget counts copies produced; shared values
/// and memo hits are free. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloneLimits {
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
}

impl CloneLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => anyhow::bail!("Failed to read {path}. {e}"),
        }
    }
}
