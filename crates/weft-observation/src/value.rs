//! The dynamic value domain binding expressions evaluate against.
//!
//! [`Value`] is the closed set of runtime values. [`Obj`] is a shared
//! dynamic object with named properties; it is also the seam where accessor
//! interception lives. [`List`] is a shared sequence whose mutators emit
//! structured change records once an [`ArrayObserver`] is attached.
//!
//! # Identity vs. equality
//!
//! Scalars (`Null`, `Bool`, `Int`, `Float`, `Str`) compare structurally.
//! `Object`, `List`, and `Func` compare by reference identity — this is the
//! "strict identity" that idempotent-write suppression and the dirty
//! checker use, so replacing an object with a structurally equal but
//! distinct one still counts as a change.
//!
//! # Interception contract
//!
//! - `Obj::set` routes through the installed property observer when one
//!   exists and has live subscribers; otherwise it writes raw.
//! - `Obj::set_silent` always writes raw, modeling mutation through a path
//!   the interception layer cannot see. Such writes are only detected by
//!   dirty checking.
//! - Computed (getter-only) and sealed properties can never be
//!   intercepted; the observer locator falls back to dirty checking for
//!   them.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::collection::{ArrayObserver, ChangeRecord};
use crate::flags::BindingFlags;
use crate::property::PropertyObserver;

type Map<K, V> = HashMap<K, V, ahash::RandomState>;
type Set<K> = HashSet<K, ahash::RandomState>;

/// A callable value: a native function over [`Value`] arguments.
pub type Method = Rc<dyn Fn(&[Value]) -> Value>;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// Absent / null / undefined.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Immutable shared string.
    Str(Rc<str>),
    /// Shared observable list (identity semantics).
    List(List),
    /// Shared observed object (identity semantics).
    Object(Obj),
    /// Callable (identity semantics).
    Func(Method),
}

impl Value {
    /// Shorthand for a string value.
    #[must_use]
    pub fn str(s: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(s.as_ref()))
    }

    /// Shorthand for a callable value.
    #[must_use]
    pub fn func(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self::Func(Rc::new(f))
    }

    /// Truthiness: `Null`, `false`, `0`, `0.0`, and `""` are falsy;
    /// everything else (including empty lists and objects) is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(_) | Self::Object(_) | Self::Func(_) => true,
        }
    }

    /// A short name for the value's variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Func(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => List::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Obj::ptr_eq(a, b),
            (Self::Func(a), Self::Func(b)) => {
                std::ptr::eq(Rc::as_ptr(a).cast::<u8>(), Rc::as_ptr(b).cast::<u8>())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(l) => write!(f, "<list len={}>", l.len()),
            Self::Object(o) => write!(f, "<object props={}>", o.property_count()),
            Self::Func(_) => write!(f, "<function>"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::str(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Rc::from(v.as_str()))
    }
}

impl From<Obj> for Value {
    fn from(v: Obj) -> Self {
        Self::Object(v)
    }
}

impl From<List> for Value {
    fn from(v: List) -> Self {
        Self::List(v)
    }
}

// ---------------------------------------------------------------------------
// Obj — observed object
// ---------------------------------------------------------------------------

struct ObjInner {
    properties: RefCell<Map<String, Value>>,
    computed: RefCell<Map<String, Rc<dyn Fn(&Obj) -> Value>>>,
    sealed: RefCell<Set<String>>,
    observers: RefCell<Map<String, Rc<dyn PropertyObserver>>>,
}

/// A shared dynamic object with observable named properties.
///
/// Cloning is cheap (shared inner). Identity, not structure, defines
/// equality — see [`Obj::ptr_eq`].
#[derive(Clone)]
pub struct Obj {
    inner: Rc<ObjInner>,
}

impl Obj {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjInner {
                properties: RefCell::new(Map::default()),
                computed: RefCell::new(Map::default()),
                sealed: RefCell::new(Set::default()),
                observers: RefCell::new(Map::default()),
            }),
        }
    }

    /// Build an object from `(name, value)` pairs (raw defines, no
    /// notification).
    #[must_use]
    pub fn with(props: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let obj = Self::new();
        for (name, value) in props {
            obj.set_silent(name, value);
        }
        obj
    }

    /// Read a property. Computed getters run on every read; a missing
    /// property yields [`Value::Null`].
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        if let Some(v) = self.inner.properties.borrow().get(name) {
            return v.clone();
        }
        let getter = self.inner.computed.borrow().get(name).cloned();
        match getter {
            Some(getter) => getter(self),
            None => Value::Null,
        }
    }

    /// Whether the object exposes `name` as a data or computed property.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.inner.properties.borrow().contains_key(name)
            || self.inner.computed.borrow().contains_key(name)
    }

    /// Write a property, routing through the installed observer (if any)
    /// so subscribers fan out synchronously.
    pub fn set(&self, name: &str, value: Value) {
        self.set_with_flags(name, value, BindingFlags::empty());
    }

    /// [`Obj::set`] with explicit context flags threaded to subscribers.
    ///
    /// Writes to a computed (getter-only) property are ignored: the getter
    /// can never be shadowed by a data property. Sealed properties are
    /// never routed: their writes land raw and are only visible to dirty
    /// checking.
    pub fn set_with_flags(&self, name: &str, value: Value, flags: BindingFlags) {
        if self.is_computed(name) {
            tracing::debug!(property = name, "ignoring write to computed property");
            return;
        }
        if self.is_sealed(name) {
            self.set_raw(name, value);
            return;
        }
        let observer = self.inner.observers.borrow().get(name).cloned();
        match observer {
            Some(observer) if observer.subscriber_count() > 0 => {
                observer.set_value(value, flags);
            }
            _ => self.set_raw(name, value),
        }
    }

    /// Write a property without notifying anyone, even if an interception
    /// observer is installed. Only dirty checking can detect such writes.
    pub fn set_silent(&self, name: &str, value: Value) {
        self.set_raw(name, value);
    }

    /// Define a getter-only computed property. Computed properties cannot
    /// be intercepted and are observed via dirty checking.
    pub fn define_computed(&self, name: &str, getter: impl Fn(&Obj) -> Value + 'static) {
        self.inner
            .computed
            .borrow_mut()
            .insert(name.to_owned(), Rc::new(getter));
    }

    /// Mark a property non-configurable: interception installation fails
    /// for it and the locator falls back to dirty checking.
    pub fn seal(&self, name: &str) {
        self.inner.sealed.borrow_mut().insert(name.to_owned());
    }

    /// Whether `name` is a computed (getter-only) property.
    #[must_use]
    pub fn is_computed(&self, name: &str) -> bool {
        self.inner.computed.borrow().contains_key(name)
    }

    /// Whether `name` is sealed against interception.
    #[must_use]
    pub fn is_sealed(&self, name: &str) -> bool {
        self.inner.sealed.borrow().contains(name)
    }

    /// Stable identity for registry keys and identity comparison.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// Whether two handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of data properties (excludes computed).
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.inner.properties.borrow().len()
    }

    pub(crate) fn downgrade(&self) -> WeakObj {
        WeakObj(Rc::downgrade(&self.inner))
    }

    pub(crate) fn get_raw(&self, name: &str) -> Value {
        self.inner
            .properties
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub(crate) fn set_raw(&self, name: &str, value: Value) {
        self.inner
            .properties
            .borrow_mut()
            .insert(name.to_owned(), value);
    }

    pub(crate) fn observer_for(&self, name: &str) -> Option<Rc<dyn PropertyObserver>> {
        self.inner.observers.borrow().get(name).cloned()
    }

    pub(crate) fn install_observer(&self, name: &str, observer: Rc<dyn PropertyObserver>) {
        self.inner
            .observers
            .borrow_mut()
            .insert(name.to_owned(), observer);
    }

    pub(crate) fn remove_observer(&self, name: &str) {
        self.inner.observers.borrow_mut().remove(name);
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("properties", &self.inner.properties.borrow().len())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

/// Weak handle to an [`Obj`], used by observers to avoid keeping the
/// observed object alive (the object already owns the observer cache, so a
/// strong back-reference would cycle).
#[derive(Clone)]
pub(crate) struct WeakObj(Weak<ObjInner>);

impl WeakObj {
    pub(crate) fn upgrade(&self) -> Option<Obj> {
        self.0.upgrade().map(|inner| Obj { inner })
    }
}

// ---------------------------------------------------------------------------
// List — observable sequence
// ---------------------------------------------------------------------------

struct ListInner {
    items: RefCell<Vec<Value>>,
    observer: RefCell<Option<Rc<ArrayObserver>>>,
}

/// A shared sequence of values with observable structural mutation.
///
/// Mutators emit [`ChangeRecord`]s to the attached [`ArrayObserver`] (if
/// any has live subscribers), enabling minimal-patch consumers such as
/// iteration bindings.
#[derive(Clone)]
pub struct List {
    inner: Rc<ListInner>,
}

impl List {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    /// Create a list from existing values.
    #[must_use]
    pub fn from_values(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                observer: RefCell::new(None),
            }),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Read the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Copy out the current contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Replace the element at `index`, emitting a one-element record.
    ///
    /// Out-of-range writes are ignored (no record).
    pub fn set(&self, index: usize, value: Value) {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) => {
                    let old = std::mem::replace(slot, value);
                    vec![old]
                }
                None => return,
            }
        };
        self.emit(ChangeRecord {
            index,
            removed,
            added: 1,
        });
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(value);
            items.len() - 1
        };
        self.emit(ChangeRecord {
            index,
            removed: Vec::new(),
            added: 1,
        });
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        let (index, removed) = {
            let mut items = self.inner.items.borrow_mut();
            let removed = items.pop()?;
            (items.len(), removed)
        };
        self.emit(ChangeRecord {
            index,
            removed: vec![removed.clone()],
            added: 0,
        });
        Some(removed)
    }

    /// Insert an element at `index` (clamped to the current length).
    pub fn insert(&self, index: usize, value: Value) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, value);
            index
        };
        self.emit(ChangeRecord {
            index,
            removed: Vec::new(),
            added: 1,
        });
    }

    /// Remove and return the element at `index`, if in range.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.emit(ChangeRecord {
            index,
            removed: vec![removed.clone()],
            added: 0,
        });
        Some(removed)
    }

    /// Remove `delete_count` elements starting at `start` (both clamped)
    /// and insert `items` in their place. Returns the removed elements.
    pub fn splice(&self, start: usize, delete_count: usize, new_items: Vec<Value>) -> Vec<Value> {
        let added = new_items.len();
        let (start, removed) = {
            let mut items = self.inner.items.borrow_mut();
            let start = start.min(items.len());
            let end = (start + delete_count).min(items.len());
            let removed: Vec<Value> = items.splice(start..end, new_items).collect();
            (start, removed)
        };
        if removed.is_empty() && added == 0 {
            return removed;
        }
        self.emit(ChangeRecord {
            index: start,
            removed: removed.clone(),
            added,
        });
        removed
    }

    /// Stable identity for registry keys and identity comparison.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// Whether two handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn attached_observer(&self) -> Option<Rc<ArrayObserver>> {
        self.inner.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<ArrayObserver>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    pub(crate) fn detach_observer(&self) {
        *self.inner.observer.borrow_mut() = None;
    }

    fn emit(&self, record: ChangeRecord) {
        let observer = self.inner.observer.borrow().clone();
        if let Some(observer) = observer {
            if observer.subscriber_count() > 0 {
                observer.notify(&record, BindingFlags::empty());
            }
        }
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("len", &self.len())
            .field("observed", &self.inner.observer.borrow().is_some())
            .finish()
    }
}
