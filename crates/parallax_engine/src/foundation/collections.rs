//! Specialized collection types

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to a scroll layer owned by a parallax manager.
    ///
    /// Handles stay valid across re-sorting and are never reused for a
    /// different layer after it is detached.
    pub struct LayerId;
}

/// Handle-based map of layers keyed by [`LayerId`]
pub type LayerMap<T> = SlotMap<LayerId, T>;
