//! Scene context shared between a host scene and its parallax managers
//!
//! Only one manager may drive a scene. Managers register with the context on
//! creation and unregister when dropped; the earliest live registration is
//! authoritative and every later one is inert.
//!
//! The context is single-threaded (`Rc`), like the per-frame loop it serves.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Identifier of a manager registered in a scene context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

#[derive(Debug, Default)]
struct ManagerRegistry {
    next_id: u64,
    live: Vec<ManagerId>,
}

/// Handle to a scene's manager registry
///
/// Cloning yields another handle to the same scene.
#[derive(Debug, Clone, Default)]
pub struct SceneContext {
    registry: Rc<RefCell<ManagerRegistry>>,
}

impl SceneContext {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new manager; it is authoritative only if no other manager is live
    pub(crate) fn register(&self) -> ManagerRegistration {
        let mut registry = self.registry.borrow_mut();
        let id = ManagerId(registry.next_id);
        registry.next_id += 1;
        registry.live.push(id);
        ManagerRegistration {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Manager currently driving this scene
    pub fn active_manager(&self) -> Option<ManagerId> {
        self.registry.borrow().live.first().copied()
    }

    /// Number of live managers, including inert duplicates
    pub fn manager_count(&self) -> usize {
        self.registry.borrow().live.len()
    }
}

/// Registration owned by a manager; unregisters on drop
#[derive(Debug)]
pub(crate) struct ManagerRegistration {
    id: ManagerId,
    registry: Weak<RefCell<ManagerRegistry>>,
}

impl ManagerRegistration {
    pub(crate) const fn id(&self) -> ManagerId {
        self.id
    }

    /// Whether this registration is the scene's active manager
    pub(crate) fn is_authoritative(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.borrow().live.first() == Some(&self.id))
    }
}

impl Drop for ManagerRegistration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().live.retain(|id| *id != self.id);
        }
    }
}
