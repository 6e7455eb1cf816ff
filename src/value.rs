// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::container::{Container, ContainerKind, CustomContainer, Elements, Entry, Frozen, Shape};
use crate::number::Number;
use crate::record::Record;
use crate::Rc;

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use anyhow::{anyhow, Result};
use indexmap::{IndexMap, IndexSet};

/// A node of an object graph.
///
/// Null and the primitive variants are plain values. `Container`, `Frozen`
/// and `Record` are references: cloning the `Value` aliases the same node, and
/// equality, ordering and hashing use the node's identity rather than its
/// contents.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Number(Number),
    String(Rc<str>),
    Container(Container),
    Frozen(Frozen),
    Record(Record),
}

/// Copy strategy of a value, decided from its variant and declared type only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Null,
    ValueType,
    Sequence,
    Set,
    Mapping,
    Composite,
}

impl From<Shape> for Category {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Sequence => Category::Sequence,
            Shape::Set => Category::Set,
            Shape::Mapping => Category::Mapping,
        }
    }
}

impl Value {
    pub fn category(&self) -> Category {
        match self {
            Value::Null => Category::Null,
            Value::Bool(_) | Value::Char(_) | Value::Number(_) | Value::String(_) => {
                Category::ValueType
            }
            Value::Container(c) => c.shape().into(),
            Value::Frozen(f) => f.shape().into(),
            Value::Record(_) => Category::Composite,
        }
    }

    /// Whether the engine may hand out this value itself instead of a copy.
    ///
    /// Frozen containers and immutable records only ever hold shareable
    /// values, so this holds for everything reachable from them as well.
    pub fn is_shareable(&self) -> bool {
        match self {
            Value::Container(_) => false,
            Value::Record(r) => r.record_type().is_immutable(),
            _ => true,
        }
    }

    /// Identity of a reference node. `None` for plain values.
    pub fn node_id(&self) -> Option<usize> {
        match self {
            Value::Container(c) => Some(c.addr()),
            Value::Frozen(f) => Some(f.addr()),
            Value::Record(r) => Some(r.addr()),
            _ => None,
        }
    }

    /// Whether both values are the same node (or equal plain values).
    pub fn same(&self, other: &Value) -> bool {
        self == other
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Char(_) => 2,
            Value::Number(_) => 3,
            Value::String(_) => 4,
            Value::Container(_) => 5,
            Value::Frozen(_) => 6,
            Value::Record(_) => 7,
        }
    }
}

impl Value {
    pub fn new_vec() -> Value {
        Value::from(Vec::<Value>::new())
    }

    pub fn new_deque() -> Value {
        Value::from(VecDeque::<Value>::new())
    }

    pub fn new_hash_set() -> Value {
        Value::from_elements(Elements::HashSet(HashSet::new()))
    }

    pub fn new_index_set() -> Value {
        Value::from_elements(Elements::IndexSet(IndexSet::new()))
    }

    pub fn new_btree_set() -> Value {
        Value::from_elements(Elements::BTreeSet(BTreeSet::new()))
    }

    pub fn new_hash_map() -> Value {
        Value::from_elements(Elements::HashMap(HashMap::new()))
    }

    pub fn new_index_map() -> Value {
        Value::from_elements(Elements::IndexMap(IndexMap::new()))
    }

    pub fn new_btree_map() -> Value {
        Value::from_elements(Elements::BTreeMap(BTreeMap::new()))
    }

    pub fn from_elements(elements: Elements) -> Value {
        Value::Container(Container::new(elements))
    }

    pub fn from_custom(container: Box<dyn CustomContainer>) -> Value {
        Value::from_elements(Elements::Custom(container))
    }

    /// Fails if any element is a mutable container or record.
    pub fn frozen_seq(values: Vec<Value>) -> Result<Value> {
        Ok(Value::Frozen(Frozen::seq(values)?))
    }

    pub fn frozen_set(values: impl IntoIterator<Item = Value>) -> Result<Value> {
        Ok(Value::Frozen(Frozen::set(values)?))
    }

    pub fn frozen_map(entries: impl IntoIterator<Item = (Value, Value)>) -> Result<Value> {
        Ok(Value::Frozen(Frozen::map(entries)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(anyhow!("not a bool")),
        }
    }

    pub fn as_char(&self) -> Result<char> {
        match self {
            Value::Char(c) => Ok(*c),
            _ => Err(anyhow!("not a char")),
        }
    }

    pub fn as_number(&self) -> Result<&Number> {
        match self {
            Value::Number(n) => Ok(n),
            _ => Err(anyhow!("not a number")),
        }
    }

    pub fn as_string(&self) -> Result<&Rc<str>> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(anyhow!("not a string")),
        }
    }

    pub fn as_container(&self) -> Result<&Container> {
        match self {
            Value::Container(c) => Ok(c),
            _ => Err(anyhow!("not a container")),
        }
    }

    pub fn as_frozen(&self) -> Result<&Frozen> {
        match self {
            Value::Frozen(f) => Ok(f),
            _ => Err(anyhow!("not a frozen container")),
        }
    }

    pub fn as_record(&self) -> Result<&Record> {
        match self {
            Value::Record(r) => Ok(r),
            _ => Err(anyhow!("not a record")),
        }
    }

    /// Concrete kind of a mutable container.
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Value::Container(c) => Some(c.kind().clone()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::from_elements(Elements::Vec(a))
    }
}

impl From<VecDeque<Value>> for Value {
    fn from(a: VecDeque<Value>) -> Self {
        Value::from_elements(Elements::VecDeque(a))
    }
}

impl From<Container> for Value {
    fn from(c: Container) -> Self {
        Value::Container(c)
    }
}

impl From<Frozen> for Value {
    fn from(f: Frozen) -> Self {
        Value::Frozen(f)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            // Reference nodes order by address.
            (a, b) if a.rank() == b.rank() => a.node_id().cmp(&b.node_id()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Number(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            _ => self.node_id().hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Char(c) => write!(f, "Char({c:?})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Container(c) => write!(f, "Container({c:?})"),
            Value::Frozen(fr) => write!(f, "Frozen({fr:?})"),
            Value::Record(r) => write!(f, "Record({r:?})"),
        }
    }
}

/// Renders the whole graph. A node reached again while it is still being
/// rendered prints as `<cycle>`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = vec![];
        write_value(self, f, &mut path)
    }
}

fn write_value(v: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    let Some(id) = v.node_id() else {
        return write_plain(v, f);
    };
    if path.contains(&id) {
        return f.write_str("<cycle>");
    }
    path.push(id);
    let r = write_node(v, f, path);
    path.pop();
    r
}

fn write_plain(v: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match v {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Char(c) => write!(f, "{c:?}"),
        Value::Number(n) => write!(f, "{n}"),
        Value::String(s) => write!(f, "{:?}", s.as_ref()),
        _ => write_node(v, f, &mut vec![]),
    }
}

fn write_node(v: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    match v {
        Value::Container(c) => {
            let entries = match c.try_borrow() {
                Some(elements) => elements.entries(),
                None => return f.write_str("<borrowed>"),
            };
            write_entries(c.shape(), &entries, f, path)
        }
        Value::Frozen(fr) => write_entries(fr.shape(), &fr.entries(), f, path),
        Value::Record(r) => {
            let Some(slots) = r.try_slots() else {
                return f.write_str("<borrowed>");
            };
            let ty = r.record_type();
            write!(f, "{} {{", ty.name())?;
            for (i, (def, slot)) in ty.fields().iter().zip(slots).enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, " {}: ", def.name())?;
                write_value(&slot, f, path)?;
            }
            f.write_str(" }")
        }
        _ => write_plain(v, f),
    }
}

fn write_entries(
    shape: Shape,
    entries: &[Entry],
    f: &mut fmt::Formatter<'_>,
    path: &mut Vec<usize>,
) -> fmt::Result {
    let (open, close) = match shape {
        Shape::Sequence => ("[", "]"),
        Shape::Set | Shape::Mapping => ("{", "}"),
    };
    f.write_str(open)?;
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match entry {
            Entry::Element(e) => write_value(e, f, path)?,
            Entry::Pair(k, v) => {
                write_value(k, f, path)?;
                f.write_str(": ")?;
                write_value(v, f, path)?;
            }
        }
    }
    f.write_str(close)
}
