// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::Result;
use graphclone::graph::{isomorphic, shares_mutable_state};
use graphclone::*;

use crate::common::*;

#[test]
fn alex_with_mutable_books() -> Result<()> {
    let ty = man_type();
    let alex = man(&ty, "Alex", 34, books(&["book 1"]))?;

    let copy = Cloner::new().deep_clone_record(&alex)?;

    assert!(!copy.ptr_eq(&alex));
    assert_eq!(copy.get("name")?, Value::from("Alex"));
    assert_eq!(copy.get("age")?, Value::from(34));

    let original_books = alex.get("favoriteBooks")?;
    let copied_books = copy.get("favoriteBooks")?;
    assert!(!copied_books.same(&original_books));
    assert_eq!(copied_books.as_container()?.kind(), &ContainerKind::Vec);
    assert_eq!(copied_books.as_container()?.get(0), Some(Value::from("book 1")));

    copied_books.as_container()?.push(Value::from("book 2"))?;
    assert_eq!(copied_books.as_container()?.len(), 2);
    assert_eq!(original_books.as_container()?.len(), 1);
    Ok(())
}

#[test]
fn frozen_books_are_shared() -> Result<()> {
    let ty = man_type();
    let frozen = Value::frozen_seq(vec![Value::from("book 1")])?;
    let alex = man(&ty, "Alex", 34, frozen.clone())?;

    let copy = Cloner::new().deep_clone_record(&alex)?;

    assert!(!copy.ptr_eq(&alex));
    assert!(copy.get("favoriteBooks")?.same(&frozen));
    Ok(())
}

#[test]
fn nothing_mutable_is_reachable_through_shared_nodes() -> Result<()> {
    let label_type = RecordType::builder("Label")
        .field(FieldDef::new("text", FieldType::String))
        .constructor(vec![FieldType::String], |args| Ok(args.to_vec()))
        .immutable()
        .build();
    let label = Value::from(label_type.construct(vec![Value::from("x")])?);
    let shelf = Value::frozen_seq(vec![
        Value::frozen_seq(vec![Value::from("book 1")])?,
        label.clone(),
    ])?;
    let root = Value::from(vec![shelf.clone(), books(&["book 2"])]);

    let copy = deep_clone(&root)?;

    assert!(copy.as_container()?.get(0).is_some_and(|s| s.same(&shelf)));
    assert!(!shares_mutable_state(&root, &copy));

    let copied_list = copy.as_container()?.get(1).unwrap_or(Value::Null);
    copied_list.as_container()?.push(Value::from("book 3"))?;
    let original_list = root.as_container()?.get(1).unwrap_or(Value::Null);
    assert_eq!(original_list.as_container()?.len(), 1);
    Ok(())
}

#[test]
fn mutual_friends() -> Result<()> {
    let ty = person_type();
    let a = person(&ty, "A")?;
    let b = person(&ty, "B")?;
    a.set("friend", Value::from(b.clone()))?;
    b.set("friend", Value::from(a.clone()))?;

    let a2 = Cloner::new().deep_clone_record(&a)?;
    let b2 = a2.get("friend")?;
    let b2 = b2.as_record()?;

    assert!(!a2.ptr_eq(&a));
    assert!(!b2.ptr_eq(&b));
    assert_eq!(b2.get("name")?, Value::from("B"));
    assert!(b2.get("friend")?.as_record()?.ptr_eq(&a2));
    Ok(())
}

#[test]
fn self_reference_points_to_copy() -> Result<()> {
    let ty = person_type();
    let narcissus = person(&ty, "Narcissus")?;
    narcissus.set("friend", Value::from(narcissus.clone()))?;

    let copy = Cloner::new().deep_clone_record(&narcissus)?;
    let friend = copy.get("friend")?;

    assert!(friend.as_record()?.ptr_eq(&copy));
    assert!(!friend.as_record()?.ptr_eq(&narcissus));
    Ok(())
}

#[test]
fn aliasing_is_preserved() -> Result<()> {
    let pair = RecordType::builder("Pair")
        .field(FieldDef::new("left", FieldType::Ref))
        .field(FieldDef::new("right", FieldType::Ref))
        .zeroed()
        .build();
    let shared = books(&["x"]);
    let p = pair.instantiate_blank()?;
    p.set("left", shared.clone())?;
    p.set("right", shared.clone())?;

    let copy = deep_clone(&Value::from(p.clone()))?;
    let copy = copy.as_record()?;
    let (left, right) = (copy.get("left")?, copy.get("right")?);

    assert!(left.same(&right));
    assert!(!left.same(&shared));
    Ok(())
}

#[test]
fn self_containing_vec() -> Result<()> {
    let v = Value::new_vec();
    v.as_container()?.push(Value::from(1))?;
    v.as_container()?.push(v.clone())?;

    let copy = deep_clone(&v)?;
    let inner = copy.as_container()?.get(1);

    assert!(!copy.same(&v));
    assert!(inner.is_some_and(|i| i.same(&copy)));
    assert!(isomorphic(&v, &copy));
    assert!(!shares_mutable_state(&v, &copy));
    Ok(())
}

#[test]
fn record_keys_map_to_their_copies() -> Result<()> {
    let ty = person_type();
    let alice = person(&ty, "Alice")?;
    let bob = person(&ty, "Bob")?;
    alice.set("friend", Value::from(bob.clone()))?;

    let scores = Value::new_hash_map();
    scores
        .as_container()?
        .insert_entry(Value::from(alice.clone()), Value::from(10))?;
    scores
        .as_container()?
        .insert_entry(Value::from(bob.clone()), Value::from(20))?;

    let root = Value::from(vec![scores.clone(), Value::from(alice.clone())]);
    let copy = deep_clone(&root)?;
    let copied_scores = copy.as_container()?.get(0).unwrap_or(Value::Null);
    let copied_alice = copy.as_container()?.get(1).unwrap_or(Value::Null);

    let copied_scores = copied_scores.as_container()?;
    assert_eq!(copied_scores.kind(), &ContainerKind::HashMap);
    assert_eq!(copied_scores.len(), 2);
    // The key is the same copy that appears elsewhere in the graph.
    assert_eq!(copied_scores.get_key(&copied_alice), Some(Value::from(10)));
    assert!(!copied_scores.contains(&Value::from(alice.clone())));

    let copied_bob = copied_alice.as_record()?.get("friend")?;
    assert_eq!(copied_scores.get_key(&copied_bob), Some(Value::from(20)));
    assert!(isomorphic(&root, &copy));
    Ok(())
}

#[test]
fn container_kinds_are_preserved() -> Result<()> {
    let containers = vec![
        Value::new_vec(),
        Value::new_deque(),
        Value::new_hash_set(),
        Value::new_index_set(),
        Value::new_btree_set(),
        Value::new_hash_map(),
        Value::new_index_map(),
        Value::new_btree_map(),
    ];
    for c in &containers {
        let copy = deep_clone(c)?;
        assert_eq!(copy.container_kind(), c.container_kind());
        assert!(!copy.same(c));
    }
    Ok(())
}

#[test]
fn insertion_order_is_kept() -> Result<()> {
    let set = Value::new_index_set();
    let map = Value::new_index_map();
    for word in ["pear", "apple", "fig", "banana"] {
        set.as_container()?.insert(Value::from(word))?;
        map.as_container()?
            .insert_entry(Value::from(word), Value::from(word.len()))?;
    }

    let set_copy = deep_clone(&set)?;
    let map_copy = deep_clone(&map)?;

    assert_eq!(
        set_copy.as_container()?.entries(),
        set.as_container()?.entries()
    );
    assert_eq!(
        map_copy.as_container()?.entries(),
        map.as_container()?.entries()
    );
    Ok(())
}

#[test]
fn heterogeneous_people() -> Result<()> {
    let ty = man_type();
    let frozen = Value::frozen_seq(vec![Value::from("book 1")])?;
    let deque = Value::from(VecDeque::from(vec![Value::from("book 3")]));
    let people = Value::from(vec![
        Value::from(man(&ty, "Alex", 34, frozen.clone())?),
        Value::from(man(&ty, "Igor", 24, books(&["book 2"]))?),
        Value::from(man(&ty, "Sergei", 32, deque.clone())?),
    ]);

    let copy = deep_clone(&people)?;
    let copy = copy.as_container()?;
    assert_eq!(copy.len(), 3);

    let books_of = |i: usize| -> Result<Value> {
        let m = copy.get(i).unwrap_or(Value::Null);
        m.as_record()?.get("favoriteBooks")
    };
    assert!(books_of(0)?.same(&frozen));
    assert_eq!(books_of(1)?.container_kind(), Some(ContainerKind::Vec));
    assert_eq!(books_of(2)?.container_kind(), Some(ContainerKind::VecDeque));
    assert!(!books_of(2)?.same(&deque));
    assert!(!shares_mutable_state(&people, &Value::Container(copy.clone())));
    assert_eq!(
        copy.get(2).unwrap_or(Value::Null).to_string(),
        r#"Man { name: "Sergei", age: 32, favoriteBooks: ["book 3"] }"#
    );
    Ok(())
}

#[test]
fn plain_values_pass_through() -> Result<()> {
    for v in [
        Value::Null,
        Value::from(true),
        Value::from('c'),
        Value::from(2.5),
        Value::from("text"),
    ] {
        assert_eq!(deep_clone(&v)?, v);
    }
    Ok(())
}

#[test]
fn immutable_records_are_shared() -> Result<()> {
    let point = RecordType::builder("Point")
        .field(FieldDef::new("x", FieldType::Int))
        .field(FieldDef::new("y", FieldType::Int))
        .constructor(vec![FieldType::Int, FieldType::Int], |args| Ok(args.to_vec()))
        .immutable()
        .build();
    let origin = point.construct(vec![Value::from(0), Value::from(0)])?;
    let path = Value::from(vec![Value::from(origin.clone())]);

    let copy = deep_clone(&path)?;

    assert!(!copy.same(&path));
    assert!(copy
        .as_container()?
        .get(0)
        .is_some_and(|p| p.same(&Value::from(origin.clone()))));
    Ok(())
}

#[test]
fn record_roots_are_copied_or_shared() -> Result<()> {
    let ty = person_type();
    let p = person(&ty, "Pat")?;
    p.set("friend", Value::from(p.clone()))?;

    let copy = Cloner::new().deep_clone_record(&p)?;
    assert!(!copy.ptr_eq(&p));
    assert!(copy.get("friend")?.as_record()?.ptr_eq(&copy));

    let point = RecordType::builder("Origin")
        .field(FieldDef::new("x", FieldType::Int))
        .zeroed()
        .immutable()
        .build();
    let origin = point.instantiate_blank()?;
    assert!(Cloner::new().deep_clone_record(&origin)?.ptr_eq(&origin));

    // A record root counts against the node budget like any other node.
    let cloner = Cloner::with_limits(CloneLimits::default().with_max_nodes(0));
    assert_eq!(
        cloner.deep_clone_record(&p).err(),
        Some(CloneError::NodeLimitExceeded { limit: 0 })
    );
    Ok(())
}

#[test]
fn transient_and_fixed_fields_are_not_copied() -> Result<()> {
    let account = RecordType::builder("Account")
        .field(FieldDef::new("id", FieldType::Int).fixed())
        .field(FieldDef::new("owner", FieldType::String))
        .field(FieldDef::new("cache", FieldType::Ref).transient())
        .constructor(vec![FieldType::Int], |args| {
            Ok(vec![args[0].clone(), Value::Null, Value::Null])
        })
        .build();
    let acc = account.construct(vec![Value::from(42)])?;
    acc.set("owner", Value::from("Dana"))?;
    acc.set("cache", books(&["cached"]))?;

    let copy = Cloner::new().deep_clone_record(&acc)?;

    assert_eq!(copy.get("owner")?, Value::from("Dana"));
    // Fixed and transient fields keep what blank construction gave them.
    assert_eq!(copy.get("id")?, Value::from(0));
    assert!(copy.get("cache")?.is_null());
    Ok(())
}

#[test]
fn fewest_parameter_constructor_is_used() -> Result<()> {
    let calls = Rc::new(Cell::new((0, 0)));
    let (c1, c2) = (calls.clone(), calls.clone());
    let widget = RecordType::builder("Widget")
        .field(FieldDef::new("label", FieldType::String))
        .field(FieldDef::new("size", FieldType::Int))
        .constructor(vec![FieldType::String, FieldType::Int], move |args| {
            let (a, b) = c1.get();
            c1.set((a + 1, b));
            Ok(args.to_vec())
        })
        .constructor(vec![FieldType::Int], move |args| {
            let (a, b) = c2.get();
            c2.set((a, b + 1));
            Ok(vec![Value::Null, args[0].clone()])
        })
        .build();
    let w = widget.construct(vec![Value::from("big"), Value::from(10)])?;
    assert_eq!(calls.get(), (1, 0));

    let copy = Cloner::new().deep_clone_record(&w)?;

    assert_eq!(calls.get(), (1, 1));
    assert_eq!(copy.get("label")?, Value::from("big"));
    assert_eq!(copy.get("size")?, Value::from(10));
    Ok(())
}

#[test]
fn zeroed_types_run_no_constructor() -> Result<()> {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let note = RecordType::builder("Note")
        .field(FieldDef::new("text", FieldType::String))
        .constructor(vec![], move |_| {
            counter.set(counter.get() + 1);
            Ok(vec![Value::Null])
        })
        .zeroed()
        .build();
    let n = note.construct(vec![])?;
    n.set("text", Value::from("hi"))?;

    let copy = Cloner::new().deep_clone_record(&n)?;

    assert_eq!(calls.get(), 1);
    assert_eq!(copy.get("text")?, Value::from("hi"));
    Ok(())
}

#[test]
fn no_construction_path() -> Result<()> {
    let ghost = RecordType::builder("Ghost")
        .field(FieldDef::new("name", FieldType::String))
        .build();
    assert!(ghost.construct(vec![]).is_err());

    let err = match ghost.instantiate_blank() {
        Err(e) => e,
        Ok(_) => panic!("ghost must not be constructible"),
    };
    assert_eq!(
        err,
        CloneError::NoConstructionPath {
            type_name: "Ghost".into()
        }
    );
    Ok(())
}

#[test]
fn constructor_rejecting_defaults_aborts() -> Result<()> {
    let ty = validated_type();
    let r = ty.construct(vec![Value::from("ok")])?;
    let root = Value::from(vec![Value::from(1), Value::from(r)]);

    let err = deep_clone(&root).err();

    assert!(matches!(err, Some(CloneError::ConstructorFailed { .. })));
    assert_eq!(err.as_ref().and_then(|e| e.type_name()), Some("Validated"));
    Ok(())
}

#[test]
fn container_without_empty_construction() -> Result<()> {
    let ring = Value::from_custom(Box::new(RingBuffer {
        capacity: 2,
        items: vec![Value::from(1)],
    }));
    assert_eq!(ring.category(), Category::Sequence);

    let err = deep_clone(&Value::from(vec![ring])).err();

    assert!(matches!(
        err,
        Some(CloneError::UnsupportedContainerType { ref type_name, .. }) if type_name == "RingBuffer"
    ));
    Ok(())
}

#[test]
fn custom_container_is_copied() -> Result<()> {
    let list = Value::from_custom(Box::new(AssocList::default()));
    let inner = books(&["a"]);
    list.as_container()?
        .insert_entry(Value::from("k"), inner.clone())?;

    let copy = deep_clone(&list)?;

    assert_eq!(copy.container_kind(), list.container_kind());
    let value = copy.as_container()?.get_key(&Value::from("k"));
    assert!(value.as_ref().is_some_and(|v| !v.same(&inner)));
    assert!(isomorphic(&list, &copy));
    Ok(())
}

#[test]
fn opaque_field_fails_the_whole_clone() -> Result<()> {
    let handle = RecordType::builder("FileHandle")
        .field(FieldDef::new("path", FieldType::String))
        .field(FieldDef::new("fd", FieldType::Int).opaque())
        .zeroed()
        .build();
    let h = handle.instantiate_blank()?;
    let ty = person_type();
    let p = person(&ty, "owner")?;
    p.set("friend", Value::from(h))?;

    let err = deep_clone(&Value::from(p)).err();

    assert!(matches!(
        err,
        Some(CloneError::FieldCopyFailed { ref type_name, ref field, .. })
            if type_name == "FileHandle" && field == "fd"
    ));
    Ok(())
}

#[test]
fn borrowed_container_fails() -> Result<()> {
    let v = books(&["a"]);
    let c = v.as_container()?.clone();
    let _guard = c.borrow_mut();

    assert!(matches!(
        deep_clone(&v),
        Err(CloneError::ContainerBorrowed { .. })
    ));
    Ok(())
}

#[test]
fn calls_are_independent() -> Result<()> {
    let cloner = Cloner::new();
    let v = books(&["a", "b"]);

    let first = cloner.deep_clone(&v)?;
    let second = cloner.deep_clone(&v)?;

    assert!(!first.same(&second));
    assert!(isomorphic(&first, &second));
    Ok(())
}

#[test]
fn clone_of_clone_has_same_shape() -> Result<()> {
    let ty = person_type();
    let a = person(&ty, "A")?;
    let b = person(&ty, "B")?;
    a.set("friend", Value::from(b.clone()))?;
    b.set("friend", Value::from(a.clone()))?;
    let root = Value::from(vec![Value::from(a), Value::from(b)]);

    let once = deep_clone(&root)?;
    let twice = deep_clone(&once)?;

    assert!(isomorphic(&once, &twice));
    assert!(isomorphic(&root, &twice));
    assert!(!shares_mutable_state(&once, &twice));
    Ok(())
}
