// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::CloneError;
use crate::number::Number;
use crate::value::Value;
use crate::Rc;

use core::cell::{OnceCell, RefCell};
use core::fmt;

use anyhow::{anyhow, bail, Result};

/// Declared type of a field or constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Char,
    Int,
    UInt,
    Float,
    String,
    /// Any value, including containers and records.
    Ref,
}

impl FieldType {
    /// The zero/false/null value of the type.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Char => Value::Char('\0'),
            Self::Int => Value::Number(Number::zero()),
            Self::UInt => Value::Number(Number::UInt(0)),
            Self::Float => Value::Number(Number::Float(0.0)),
            Self::String | Self::Ref => Value::Null,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Ref, _) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Char, Value::Char(_)) => true,
            (Self::Int, Value::Number(n)) => n.as_i64().is_some(),
            (Self::UInt, Value::Number(n)) => n.as_u64().is_some(),
            (Self::Float, Value::Number(_)) => true,
            (Self::String, Value::String(_) | Value::Null) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    name: Rc<str>,
    ty: FieldType,
    transient: bool,
    fixed: bool,
    opaque: bool,
}

impl FieldDef {
    pub fn new(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            transient: false,
            fixed: false,
            opaque: false,
        }
    }

    /// Derived or cache-like state that is not carried over to copies.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Assigned by constructors only.
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Hidden from the copier. Records holding such a field cannot be cloned.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }
}

type ConstructorBody = Rc<dyn Fn(&[Value]) -> Result<Vec<Value>>>;

/// A construction path: declared parameters and a body that turns the
/// arguments into the initial field slots, in field declaration order.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<FieldType>,
    body: ConstructorBody,
}

impl Constructor {
    pub fn params(&self) -> &[FieldType] {
        &self.params
    }

    fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

/// Descriptor of a record type, shared by all of its instances.
pub struct RecordType {
    name: Rc<str>,
    fields: Vec<FieldDef>,
    constructors: Vec<Constructor>,
    zeroed: bool,
    immutable: bool,
    copyable: OnceCell<Box<[usize]>>,
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("constructors", &self.constructors)
            .field("zeroed", &self.zeroed)
            .field("immutable", &self.immutable)
            .finish()
    }
}

pub struct RecordTypeBuilder {
    name: Rc<str>,
    fields: Vec<FieldDef>,
    constructors: Vec<Constructor>,
    zeroed: bool,
    immutable: bool,
}

impl RecordTypeBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn constructor<F>(mut self, params: Vec<FieldType>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>> + 'static,
    {
        self.constructors.push(Constructor {
            params,
            body: Rc::new(body),
        });
        self
    }

    /// Instances can be created with every field at its declared default,
    /// without running any constructor.
    pub fn zeroed(mut self) -> Self {
        self.zeroed = true;
        self
    }

    /// Instances may be shared instead of copied. Their fields only accept
    /// shareable values.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn build(self) -> Rc<RecordType> {
        Rc::new(RecordType {
            name: self.name,
            fields: self.fields,
            constructors: self.constructors,
            zeroed: self.zeroed,
            immutable: self.immutable,
            copyable: OnceCell::new(),
        })
    }
}

impl RecordType {
    pub fn builder(name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            fields: vec![],
            constructors: vec![],
            zeroed: false,
            immutable: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn owned_name(&self) -> String {
        self.name.to_string()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_zeroed(&self) -> bool {
        self.zeroed
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Slots carried over to copies: everything except transient and fixed
    /// fields. Computed on first use.
    pub fn copyable_fields(&self) -> &[usize] {
        self.copyable.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .filter(|(_, f)| !f.transient && !f.fixed)
                .map(|(i, _)| i)
                .collect()
        })
    }

    /// Regular construction through a declared constructor.
    pub fn construct(self: &Rc<Self>, args: Vec<Value>) -> Result<Record> {
        let ctor = self
            .constructors
            .iter()
            .find(|c| c.accepts(&args))
            .ok_or_else(|| {
                anyhow!(
                    "`{}` has no constructor accepting {} argument(s)",
                    self.name,
                    args.len()
                )
            })?;
        let slots = (ctor.body)(&args)?;
        if slots.len() != self.fields.len() {
            bail!(
                "constructor of `{}` produced {} slot(s), expected {}",
                self.name,
                slots.len(),
                self.fields.len()
            );
        }
        for (field, value) in self.fields.iter().zip(&slots) {
            self.check_shareable(field, value)?;
        }
        Ok(Record::from_slots(self.clone(), slots))
    }

    // Instances of an immutable type are shared by the engine, so they may
    // not reach any mutable node.
    fn check_shareable(&self, field: &FieldDef, value: &Value) -> Result<()> {
        if self.immutable && !value.is_shareable() {
            bail!(
                "field `{}` of immutable `{}` cannot hold mutable value {value:?}",
                field.name,
                self.name
            );
        }
        Ok(())
    }

    /// Creates an instance for the copier to populate.
    ///
    /// A zeroed type gets every slot at its declared default. Otherwise the
    /// constructor with the fewest parameters runs with default arguments;
    /// the first declared one wins a tie.
    pub fn instantiate_blank(self: &Rc<Self>) -> Result<Record, CloneError> {
        if self.zeroed {
            let slots = self.fields.iter().map(|f| f.ty.default_value()).collect();
            return Ok(Record::from_slots(self.clone(), slots));
        }

        let ctor = self
            .constructors
            .iter()
            .min_by_key(|c| c.params.len())
            .ok_or_else(|| CloneError::NoConstructionPath {
                type_name: self.owned_name(),
            })?;
        let args: Vec<Value> = ctor.params.iter().map(FieldType::default_value).collect();
        let slots = (ctor.body)(&args).map_err(|e| CloneError::ConstructorFailed {
            type_name: self.owned_name(),
            reason: e.to_string(),
        })?;
        if slots.len() != self.fields.len() {
            return Err(CloneError::ConstructorFailed {
                type_name: self.owned_name(),
                reason: format!(
                    "produced {} slot(s), expected {}",
                    slots.len(),
                    self.fields.len()
                ),
            });
        }
        Ok(Record::from_slots(self.clone(), slots))
    }
}

pub(crate) struct RecordCell {
    ty: Rc<RecordType>,
    slots: RefCell<Vec<Value>>,
}

/// Shared handle to a record instance.
#[derive(Clone)]
pub struct Record(Rc<RecordCell>);

impl Record {
    fn from_slots(ty: Rc<RecordType>, slots: Vec<Value>) -> Self {
        Self(Rc::new(RecordCell {
            ty,
            slots: RefCell::new(slots),
        }))
    }

    pub fn record_type(&self) -> &Rc<RecordType> {
        &self.0.ty
    }

    pub fn type_name(&self) -> &str {
        self.0.ty.name()
    }

    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        let index = self.index_of(name)?;
        let slots = self
            .0
            .slots
            .try_borrow()
            .map_err(|_| anyhow!("`{}` is being modified", self.type_name()))?;
        Ok(slots[index].clone())
    }

    /// Regular assignment. Fixed fields and values of the wrong type are
    /// rejected.
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        let index = self.index_of(name)?;
        let field = &self.0.ty.fields[index];
        if field.fixed {
            bail!("field `{}` of `{}` is fixed", name, self.type_name());
        }
        if !field.ty.accepts(&value) {
            bail!(
                "field `{}` of `{}` expects {:?}, got {value:?}",
                name,
                self.type_name(),
                field.ty
            );
        }
        self.0.ty.check_shareable(field, &value)?;
        let mut slots = self
            .0
            .slots
            .try_borrow_mut()
            .map_err(|_| anyhow!("`{}` is borrowed", self.type_name()))?;
        slots[index] = value;
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.0
            .ty
            .field_index(name)
            .ok_or_else(|| anyhow!("`{}` has no field `{name}`", self.type_name()))
    }

    /// Every slot, including transient and fixed ones, in declaration order.
    pub fn slots(&self) -> Vec<Value> {
        self.0.slots.borrow().clone()
    }

    pub(crate) fn try_slots(&self) -> Option<Vec<Value>> {
        self.0.slots.try_borrow().ok().map(|s| s.clone())
    }

    pub(crate) fn read_slot(&self, index: usize) -> Result<Value, CloneError> {
        let slots = self
            .0
            .slots
            .try_borrow()
            .map_err(|_| self.field_error(index, "record is mutably borrowed"))?;
        slots
            .get(index)
            .cloned()
            .ok_or_else(|| self.field_error(index, "slot missing"))
    }

    /// Writes without type or fixed-field checks.
    pub(crate) fn write_slot(&self, index: usize, value: Value) -> Result<(), CloneError> {
        let mut slots = self
            .0
            .slots
            .try_borrow_mut()
            .map_err(|_| self.field_error(index, "record is borrowed"))?;
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.field_error(index, "slot missing")),
        }
    }

    pub(crate) fn field_error(&self, index: usize, reason: &str) -> CloneError {
        let field = self
            .0
            .ty
            .fields
            .get(index)
            .map(|f| f.name.to_string())
            .unwrap_or_else(|| format!("#{index}"));
        CloneError::FieldCopyFailed {
            type_name: self.0.ty.owned_name(),
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name(), self.addr())
    }
}
