//! Collection observation: structured change records for list mutation.
//!
//! Where property observers report a single before/after value, the
//! [`ArrayObserver`] emits [`ChangeRecord`]s — index, removed elements,
//! added count — so consumers such as iteration bindings can apply minimal
//! patches instead of re-rendering the whole sequence.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::flags::BindingFlags;
use crate::property::ObserverId;
use crate::subscriber::{Subscribers, Subscription};
use crate::value::{List, Value};

/// One structural mutation of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Index at which the mutation happened.
    pub index: usize,
    /// Elements removed at `index`, in order.
    pub removed: Vec<Value>,
    /// Number of elements inserted at `index`.
    pub added: usize,
}

/// Collection change callback: `(record, flags)`.
pub type CollectionHandler = Rc<dyn Fn(&ChangeRecord, BindingFlags)>;

/// Observer attached to one [`List`], fanning change records out to
/// subscribers.
///
/// Attached lazily by the locator; detached from the list when the last
/// subscriber drops.
pub struct ArrayObserver {
    id: ObserverId,
    list: RefCell<Option<List>>,
    subscribers: Subscribers<CollectionHandler>,
}

impl ArrayObserver {
    pub(crate) fn new(list: &List) -> Self {
        Self {
            id: ObserverId::next(),
            list: RefCell::new(Some(list.clone())),
            subscribers: Subscribers::new(),
        }
    }

    /// Identity of this observer instance.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Register a change-record callback. Dropping the returned
    /// [`Subscription`] unsubscribes; the last unsubscribe detaches the
    /// observer from the list.
    pub fn subscribe(self: Rc<Self>, handler: CollectionHandler) -> Subscription {
        let id = self.subscribers.add(handler);
        let weak = Rc::downgrade(&self);
        Subscription::new(move || {
            let Some(observer) = weak.upgrade() else {
                return;
            };
            if observer.subscribers.remove(id) == 0 {
                tracing::trace!("detaching array observer");
                if let Some(list) = observer.list.borrow_mut().take() {
                    list.detach_observer();
                }
            }
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn notify(&self, record: &ChangeRecord, flags: BindingFlags) {
        for handler in self.subscribers.snapshot() {
            handler(record, flags);
        }
    }
}

impl fmt::Debug for ArrayObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayObserver")
            .field("id", &self.id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
