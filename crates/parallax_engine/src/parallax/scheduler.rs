//! End-of-frame task scheduling
//!
//! Layers finish activating one frame after they are attached, once the host
//! has rendered the frame they were attached in. The host loop calls
//! [`ParallaxManager::end_frame`](super::ParallaxManager::end_frame) after
//! rendering, which drains the tasks scheduled so far.

use std::collections::VecDeque;

use crate::foundation::collections::LayerId;

/// Deferred work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTask {
    /// Refresh an attached layer's flagged billboard parts, then the layer list
    ActivateLayer(LayerId),
}

impl FrameTask {
    /// Layer the task operates on
    pub const fn layer(&self) -> LayerId {
        match self {
            Self::ActivateLayer(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    task: FrameTask,
    frame: u64,
}

/// Single-shot task queue keyed by frame number
#[derive(Debug, Default)]
pub struct FrameScheduler {
    frame: u64,
    pending: VecDeque<ScheduledTask>,
}

impl FrameScheduler {
    /// Create a scheduler at frame zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frame number
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of tasks waiting
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run `task` at the end of the current frame
    pub fn schedule_end_of_frame(&mut self, task: FrameTask) {
        log::trace!("Scheduled {:?} for end of frame {}", task, self.frame);
        self.pending.push_back(ScheduledTask { task, frame: self.frame });
    }

    /// Drop pending tasks for a layer
    pub fn cancel_layer(&mut self, id: LayerId) {
        self.pending.retain(|t| t.task.layer() != id);
    }

    /// Close the current frame: return its due tasks in scheduling order and advance
    pub fn end_frame(&mut self) -> Vec<FrameTask> {
        let frame = self.frame;
        let mut due = Vec::new();
        self.pending.retain(|t| {
            if t.frame <= frame {
                due.push(t.task);
                false
            } else {
                true
            }
        });
        self.frame += 1;
        due
    }
}
