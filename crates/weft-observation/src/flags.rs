//! The opaque context bit-set threaded through observation calls.

use bitflags::bitflags;

bitflags! {
    /// Context flags propagated through every bind/unbind/notify call.
    ///
    /// The observation core treats these as opaque: it combines and
    /// forwards them but never branches on them. They exist for consumers
    /// of change notifications that need to know the provenance of a write
    /// (initial bind push, teardown, flush cycle, or which direction a
    /// binding was propagating).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BindingFlags: u16 {
        /// The call originates from a `bind` pass.
        const FROM_BIND = 1;
        /// The call originates from an `unbind` pass.
        const FROM_UNBIND = 1 << 1;
        /// The call originates from a dirty-check flush cycle.
        const FROM_FLUSH = 1 << 2;
        /// A binding is currently pushing source state into its target.
        const UPDATE_TARGET = 1 << 3;
        /// A binding is currently pushing target state into its source.
        const UPDATE_SOURCE = 1 << 4;
    }
}
