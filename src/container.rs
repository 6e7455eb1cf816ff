// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;
use crate::Rc;

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use anyhow::{bail, Result};
use indexmap::{IndexMap, IndexSet};

/// Broad layout of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Sequence,
    Set,
    Mapping,
}

/// Concrete representation of a mutable container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Vec,
    VecDeque,
    HashSet,
    // Insertion ordered.
    IndexSet,
    // Sorted by key.
    BTreeSet,
    HashMap,
    IndexMap,
    BTreeMap,
    Custom { name: Rc<str>, shape: Shape },
}

impl ContainerKind {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Vec | Self::VecDeque => Shape::Sequence,
            Self::HashSet | Self::IndexSet | Self::BTreeSet => Shape::Set,
            Self::HashMap | Self::IndexMap | Self::BTreeMap => Shape::Mapping,
            Self::Custom { shape, .. } => *shape,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Vec => "Vec",
            Self::VecDeque => "VecDeque",
            Self::HashSet => "HashSet",
            Self::IndexSet => "IndexSet",
            Self::BTreeSet => "BTreeSet",
            Self::HashMap => "HashMap",
            Self::IndexMap => "IndexMap",
            Self::BTreeMap => "BTreeMap",
            Self::Custom { name, .. } => name,
        }
    }
}

/// One unit of container content: an element of a sequence or set, or a
/// key/value pair of a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Element(Value),
    Pair(Value, Value),
}

/// Container types defined outside this crate.
///
/// `new_empty` returns `None` when the type cannot be instantiated without
/// arguments; such containers cannot be deep cloned.
pub trait CustomContainer {
    fn type_name(&self) -> &str;
    fn shape(&self) -> Shape;
    /// Contents in their natural iteration order.
    fn entries(&self) -> Vec<Entry>;
    fn new_empty(&self) -> Option<Box<dyn CustomContainer>>;
    fn insert(&mut self, entry: Entry);
}

pub enum Elements {
    Vec(Vec<Value>),
    VecDeque(VecDeque<Value>),
    HashSet(HashSet<Value>),
    IndexSet(IndexSet<Value>),
    BTreeSet(BTreeSet<Value>),
    HashMap(HashMap<Value, Value>),
    IndexMap(IndexMap<Value, Value>),
    BTreeMap(BTreeMap<Value, Value>),
    Custom(Box<dyn CustomContainer>),
}

impl Elements {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Vec(_) => ContainerKind::Vec,
            Self::VecDeque(_) => ContainerKind::VecDeque,
            Self::HashSet(_) => ContainerKind::HashSet,
            Self::IndexSet(_) => ContainerKind::IndexSet,
            Self::BTreeSet(_) => ContainerKind::BTreeSet,
            Self::HashMap(_) => ContainerKind::HashMap,
            Self::IndexMap(_) => ContainerKind::IndexMap,
            Self::BTreeMap(_) => ContainerKind::BTreeMap,
            Self::Custom(c) => ContainerKind::Custom {
                name: c.type_name().into(),
                shape: c.shape(),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vec(v) => v.len(),
            Self::VecDeque(v) => v.len(),
            Self::HashSet(s) => s.len(),
            Self::IndexSet(s) => s.len(),
            Self::BTreeSet(s) => s.len(),
            Self::HashMap(m) => m.len(),
            Self::IndexMap(m) => m.len(),
            Self::BTreeMap(m) => m.len(),
            Self::Custom(c) => c.entries().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A new, empty container of the same concrete representation.
    pub fn empty_like(&self) -> Option<Elements> {
        Some(match self {
            Self::Vec(v) => Self::Vec(Vec::with_capacity(v.len())),
            Self::VecDeque(v) => Self::VecDeque(VecDeque::with_capacity(v.len())),
            Self::HashSet(s) => Self::HashSet(HashSet::with_capacity(s.len())),
            Self::IndexSet(s) => Self::IndexSet(IndexSet::with_capacity(s.len())),
            Self::BTreeSet(_) => Self::BTreeSet(BTreeSet::new()),
            Self::HashMap(m) => Self::HashMap(HashMap::with_capacity(m.len())),
            Self::IndexMap(m) => Self::IndexMap(IndexMap::with_capacity(m.len())),
            Self::BTreeMap(_) => Self::BTreeMap(BTreeMap::new()),
            Self::Custom(c) => Self::Custom(c.new_empty()?),
        })
    }

    /// Snapshot of the contents in natural iteration order.
    pub fn entries(&self) -> Vec<Entry> {
        match self {
            Self::Vec(v) => v.iter().cloned().map(Entry::Element).collect(),
            Self::VecDeque(v) => v.iter().cloned().map(Entry::Element).collect(),
            Self::HashSet(s) => s.iter().cloned().map(Entry::Element).collect(),
            Self::IndexSet(s) => s.iter().cloned().map(Entry::Element).collect(),
            Self::BTreeSet(s) => s.iter().cloned().map(Entry::Element).collect(),
            Self::HashMap(m) => pairs(m.iter()),
            Self::IndexMap(m) => pairs(m.iter()),
            Self::BTreeMap(m) => pairs(m.iter()),
            Self::Custom(c) => c.entries(),
        }
    }

    /// Adds an entry. Returns false when the entry does not fit the shape.
    pub fn insert(&mut self, entry: Entry) -> bool {
        match (self, entry) {
            (Self::Vec(v), Entry::Element(e)) => v.push(e),
            (Self::VecDeque(v), Entry::Element(e)) => v.push_back(e),
            (Self::HashSet(s), Entry::Element(e)) => {
                s.insert(e);
            }
            (Self::IndexSet(s), Entry::Element(e)) => {
                s.insert(e);
            }
            (Self::BTreeSet(s), Entry::Element(e)) => {
                s.insert(e);
            }
            (Self::HashMap(m), Entry::Pair(k, v)) => {
                m.insert(k, v);
            }
            (Self::IndexMap(m), Entry::Pair(k, v)) => {
                m.insert(k, v);
            }
            (Self::BTreeMap(m), Entry::Pair(k, v)) => {
                m.insert(k, v);
            }
            (Self::Custom(c), entry) => {
                let fits = matches!(
                    (c.shape(), &entry),
                    (Shape::Sequence | Shape::Set, Entry::Element(_)) | (Shape::Mapping, Entry::Pair(..))
                );
                if !fits {
                    return false;
                }
                c.insert(entry);
            }
            _ => return false,
        }
        true
    }
}

fn pairs<'a>(iter: impl Iterator<Item = (&'a Value, &'a Value)>) -> Vec<Entry> {
    iter.map(|(k, v)| Entry::Pair(k.clone(), v.clone())).collect()
}

pub(crate) struct ContainerCell {
    kind: ContainerKind,
    elements: RefCell<Elements>,
}

/// Shared handle to a mutable container. Cloning the handle aliases the
/// container; use the engine for an independent copy.
#[derive(Clone)]
pub struct Container(Rc<ContainerCell>);

impl Container {
    pub fn new(elements: Elements) -> Self {
        Self(Rc::new(ContainerCell {
            kind: elements.kind(),
            elements: RefCell::new(elements),
        }))
    }

    pub fn kind(&self) -> &ContainerKind {
        &self.0.kind
    }

    pub fn shape(&self) -> Shape {
        self.0.kind.shape()
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn borrow(&self) -> Ref<'_, Elements> {
        self.0.elements.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Elements> {
        self.0.elements.borrow_mut()
    }

    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, Elements>> {
        self.0.elements.try_borrow().ok()
    }

    pub(crate) fn try_borrow_mut(&self) -> Option<RefMut<'_, Elements>> {
        self.0.elements.try_borrow_mut().ok()
    }

    pub fn len(&self) -> usize {
        self.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.borrow().entries()
    }

    /// Appends to a sequence.
    pub fn push(&self, value: Value) -> Result<()> {
        if self.shape() != Shape::Sequence {
            bail!("`{}` is not a sequence", self.kind().name());
        }
        self.borrow_mut().insert(Entry::Element(value));
        Ok(())
    }

    /// Adds to a set.
    pub fn insert(&self, value: Value) -> Result<()> {
        if self.shape() != Shape::Set {
            bail!("`{}` is not a set", self.kind().name());
        }
        self.borrow_mut().insert(Entry::Element(value));
        Ok(())
    }

    pub fn insert_entry(&self, key: Value, value: Value) -> Result<()> {
        if self.shape() != Shape::Mapping {
            bail!("`{}` is not a mapping", self.kind().name());
        }
        self.borrow_mut().insert(Entry::Pair(key, value));
        Ok(())
    }

    /// Element of a sequence by position.
    pub fn get(&self, index: usize) -> Option<Value> {
        match &*self.borrow() {
            Elements::Vec(v) => v.get(index).cloned(),
            Elements::VecDeque(v) => v.get(index).cloned(),
            Elements::Custom(c) if c.shape() == Shape::Sequence => {
                match c.entries().into_iter().nth(index) {
                    Some(Entry::Element(e)) => Some(e),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Value stored under `key` in a mapping.
    pub fn get_key(&self, key: &Value) -> Option<Value> {
        match &*self.borrow() {
            Elements::HashMap(m) => m.get(key).cloned(),
            Elements::IndexMap(m) => m.get(key).cloned(),
            Elements::BTreeMap(m) => m.get(key).cloned(),
            Elements::Custom(c) => c.entries().into_iter().find_map(|e| match e {
                Entry::Pair(k, v) if &k == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Membership of a set element or mapping key.
    pub fn contains(&self, key: &Value) -> bool {
        match &*self.borrow() {
            Elements::HashSet(s) => s.contains(key),
            Elements::IndexSet(s) => s.contains(key),
            Elements::BTreeSet(s) => s.contains(key),
            Elements::HashMap(m) => m.contains_key(key),
            Elements::IndexMap(m) => m.contains_key(key),
            Elements::BTreeMap(m) => m.contains_key(key),
            Elements::Vec(v) => v.contains(key),
            Elements::VecDeque(v) => v.contains(key),
            Elements::Custom(c) => c.entries().iter().any(|e| match e {
                Entry::Element(v) | Entry::Pair(v, _) => v == key,
            }),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.kind().name(), self.addr())
    }
}

#[derive(Debug)]
pub enum FrozenElements {
    Seq(Box<[Value]>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
}

/// A container that cannot be modified after construction. The engine shares
/// it instead of copying it.
#[derive(Clone)]
pub struct Frozen(Rc<FrozenElements>);

impl Frozen {
    pub fn seq(values: Vec<Value>) -> Result<Self> {
        check_frozen(values.iter())?;
        Ok(Self(Rc::new(FrozenElements::Seq(values.into_boxed_slice()))))
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let set: IndexSet<Value> = values.into_iter().collect();
        check_frozen(set.iter())?;
        Ok(Self(Rc::new(FrozenElements::Set(set))))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Result<Self> {
        let map: IndexMap<Value, Value> = entries.into_iter().collect();
        check_frozen(map.iter().flat_map(|(k, v)| [k, v]))?;
        Ok(Self(Rc::new(FrozenElements::Map(map))))
    }

    pub fn elements(&self) -> &FrozenElements {
        &self.0
    }

    pub fn shape(&self) -> Shape {
        match &*self.0 {
            FrozenElements::Seq(_) => Shape::Sequence,
            FrozenElements::Set(_) => Shape::Set,
            FrozenElements::Map(_) => Shape::Mapping,
        }
    }

    pub fn len(&self) -> usize {
        match &*self.0 {
            FrozenElements::Seq(s) => s.len(),
            FrozenElements::Set(s) => s.len(),
            FrozenElements::Map(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<Entry> {
        match &*self.0 {
            FrozenElements::Seq(s) => s.iter().cloned().map(Entry::Element).collect(),
            FrozenElements::Set(s) => s.iter().cloned().map(Entry::Element).collect(),
            FrozenElements::Map(m) => pairs(m.iter()),
        }
    }

    pub fn ptr_eq(&self, other: &Frozen) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

// A frozen container may only hold shareable values, so sharing it never
// shares mutable state.
fn check_frozen<'a>(values: impl Iterator<Item = &'a Value>) -> Result<()> {
    for v in values {
        if !v.is_shareable() {
            bail!("frozen container cannot hold mutable value {v:?}");
        }
    }
    Ok(())
}

impl fmt::Debug for Frozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frozen@{:#x}", self.addr())
    }
}
