// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use graphclone::*;

use crate::common::*;

fn nested(levels: usize) -> Result<Value> {
    let mut v = books(&["leaf"]);
    for _ in 0..levels {
        v = Value::from(vec![v]);
    }
    Ok(v)
}

#[test]
fn parse_from_json() -> Result<()> {
    let limits = CloneLimits::from_json_str(r#"{ "max_depth": 8 }"#)?;
    assert_eq!(limits, CloneLimits::unlimited().with_max_depth(8));

    let limits = CloneLimits::from_json_str("{}")?;
    assert_eq!(limits, CloneLimits::default());

    assert!(CloneLimits::from_json_str(r#"{ "max_width": 1 }"#).is_err());
    Ok(())
}

#[test]
fn load_from_file() -> Result<()> {
    let path =
        std::env::temp_dir().join(format!("graphclone-limits-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "max_depth": 4, "max_nodes": 64 }"#)?;
    let loaded = CloneLimits::from_json_file(&path.to_string_lossy());
    std::fs::remove_file(&path)?;

    assert_eq!(
        loaded?,
        CloneLimits::unlimited().with_max_depth(4).with_max_nodes(64)
    );
    assert!(CloneLimits::from_json_file(&path.to_string_lossy()).is_err());
    Ok(())
}

#[test]
fn depth_limit() -> Result<()> {
    // Root plus three nested levels: the leaf list sits at depth 3.
    let root = nested(3)?;

    assert!(Cloner::with_limits(CloneLimits::default().with_max_depth(3))
        .deep_clone(&root)
        .is_ok());
    assert_eq!(
        Cloner::with_limits(CloneLimits::default().with_max_depth(2))
            .deep_clone(&root)
            .err(),
        Some(CloneError::DepthLimitExceeded { limit: 2 })
    );
    Ok(())
}

#[test]
fn node_limit_counts_copies_only() -> Result<()> {
    let shared = books(&["a"]);
    let root = Value::from(vec![
        shared.clone(),
        shared,
        Value::frozen_seq(vec![Value::from(1)])?,
    ]);

    // Root and the shared list; the alias and the frozen list are free.
    let mut cloner = Cloner::with_limits(CloneLimits::default().with_max_nodes(2));
    assert!(cloner.deep_clone(&root).is_ok());

    cloner.set_limits(CloneLimits::default().with_max_nodes(1));
    assert_eq!(cloner.limits().max_nodes, Some(1));
    assert_eq!(
        cloner.deep_clone(&root).err(),
        Some(CloneError::NodeLimitExceeded { limit: 1 })
    );
    Ok(())
}

#[test]
fn limits_do_not_leak_between_calls() -> Result<()> {
    let cloner = Cloner::with_limits(CloneLimits::default().with_max_nodes(2));
    let v = Value::from(vec![books(&["x"])]);
    for _ in 0..3 {
        assert!(cloner.deep_clone(&v).is_ok());
    }
    Ok(())
}
