//! Concrete runtime values of the Python subset
//!
//! Lists are shared references like Python lists: cloning a `Value::List`
//! clones the handle, so `s = seq; s[0] = 1` is visible through `seq` and a
//! callee writing `s[0]` changes the caller's list. Use
//! [`Value::deep_copy`] where a fresh object is wanted.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Concrete value produced by the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    List(ListRef),
}

/// Shared, mutable list object
#[derive(Clone, Default)]
pub struct ListRef(Rc<RefCell<Vec<Value>>>);

impl ListRef {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Overwrite one slot; `false` when `index` is out of range
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Read access to the items
    ///
    /// Do not hold the guard across a `set` on the same list.
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    /// Shallow snapshot of the items (element lists stay shared)
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Same list object (Python `is`)
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn id(&self) -> *const RefCell<Vec<Value>> {
        Rc::as_ptr(&self.0)
    }
}

impl From<Vec<Value>> for ListRef {
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

impl PartialEq for ListRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self, &mut Vec::new())
    }
}

impl Value {
    /// Fresh list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(ListRef::new(items))
    }

    /// Python type name (used in TypeError messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::List(_) => "list",
        }
    }

    /// Python truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Numeric view as f64 (bool counts as int, like Python)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view (bool counts as int)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    /// Copy with no list shared with `self`
    ///
    /// Self-referencing lists keep their inner reference instead of
    /// recursing.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_inner(&mut Vec::new())
    }

    fn deep_copy_inner(&self, active: &mut Vec<*const RefCell<Vec<Value>>>) -> Value {
        match self {
            Value::List(list) if active.contains(&list.id()) => Value::List(list.clone()),
            Value::List(list) => {
                active.push(list.id());
                let items = list.to_vec();
                let copied = items.iter().map(|item| item.deep_copy_inner(active)).collect();
                active.pop();
                Value::list(copied)
            }
            scalar => scalar.clone(),
        }
    }
}

/// Render an f64 the way Python's `repr` would accept it back
pub fn python_float_repr(value: f64) -> String {
    if value.is_nan() {
        return "float('nan')".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        };
    }
    // Debug keeps a trailing ".0" or an exponent, so the literal stays a float
    format!("{:?}", value)
}

/// `[a, b]`, or `[...]` for a list already being rendered (like `repr`)
fn write_list(
    f: &mut fmt::Formatter<'_>,
    list: &ListRef,
    active: &mut Vec<*const RefCell<Vec<Value>>>,
) -> fmt::Result {
    if active.contains(&list.id()) {
        return write!(f, "[...]");
    }
    active.push(list.id());
    write!(f, "[")?;
    for (i, item) in list.to_vec().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_value(f, item, active)?;
    }
    active.pop();
    write!(f, "]")
}

fn write_value(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    active: &mut Vec<*const RefCell<Vec<Value>>>,
) -> fmt::Result {
    match value {
        Value::None => write!(f, "None"),
        Value::Bool(true) => write!(f, "True"),
        Value::Bool(false) => write!(f, "False"),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(v) => write!(f, "{}", python_float_repr(*v)),
        Value::List(list) => write_list(f, list, active),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}
