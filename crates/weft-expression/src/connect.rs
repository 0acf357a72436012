//! The connect seam between expressions and bindings.

use weft_observation::{List, Obj};

/// Receiver for the properties and collections an expression touches
/// during a connect pass.
///
/// Implemented by connectable bindings: each reported pair becomes (or
/// refreshes) an observer subscription, and anything not reported this
/// pass is pruned afterwards. Reporting the same pair twice in one pass is
/// allowed and must be idempotent.
pub trait Connectable {
    /// The evaluated path read property `name` of `obj`.
    fn observe_property(&mut self, obj: &Obj, name: &str);

    /// The evaluated path read the structure of `list` (keyed access,
    /// length).
    fn observe_list(&mut self, list: &List);
}

/// A `Connectable` that records what it saw; test helper for expression
/// and binding suites.
#[derive(Debug, Default)]
pub struct RecordingConnectable {
    /// `(object id, property name)` pairs, in observation order.
    pub properties: Vec<(usize, String)>,
    /// List ids, in observation order.
    pub lists: Vec<usize>,
}

impl Connectable for RecordingConnectable {
    fn observe_property(&mut self, obj: &Obj, name: &str) {
        self.properties.push((obj.id(), name.to_owned()));
    }

    fn observe_list(&mut self, list: &List) {
        self.lists.push(list.id());
    }
}
