//! Explicit task scheduling over the three cadences.
//!
//! Subsystems register named callbacks at a [`Cadence`] and receive a
//! [`TaskId`] back; deleting an entity unregisters its task
//! deterministically by that id. `run_due` fires every task whose cadence
//! divides the current tick, in registration order.

use std::collections::BTreeMap;

use tracing::debug;

use crate::clock::{FAST_CADENCE_TICKS, MEDIUM_CADENCE_TICKS, SLOW_CADENCE_TICKS};

/// How often a scheduled task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cadence {
    /// Every 5 ticks: patrol stepping, engagement.
    Fast,
    /// Every 30 ticks: patrol launch.
    Medium,
    /// Every 60 ticks: heartbeat, persistence flush.
    Slow,
}

impl Cadence {
    /// The tick interval of this cadence.
    pub const fn interval(self) -> u64 {
        match self {
            Self::Fast => FAST_CADENCE_TICKS,
            Self::Medium => MEDIUM_CADENCE_TICKS,
            Self::Slow => SLOW_CADENCE_TICKS,
        }
    }

    /// Whether this cadence fires on the given tick.
    pub const fn due(self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.interval()), Some(0))
    }
}

/// Handle to a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl core::fmt::Display for TaskId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

struct Task<S> {
    name: String,
    cadence: Cadence,
    callback: Box<dyn FnMut(&mut S, u64) + Send>,
}

impl<S> core::fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .finish_non_exhaustive()
    }
}

/// Registry of cadenced tasks over a shared state type `S`.
#[derive(Debug)]
pub struct Scheduler<S> {
    tasks: BTreeMap<TaskId, Task<S>>,
    next_id: u64,
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<S> Scheduler<S> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named callback at a cadence. Returns the handle used
    /// to unregister it later.
    pub fn register<F>(&mut self, cadence: Cadence, name: &str, callback: F) -> TaskId
    where
        F: FnMut(&mut S, u64) + Send + 'static,
    {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.tasks.insert(
            id,
            Task {
                name: name.to_owned(),
                cadence,
                callback: Box::new(callback),
            },
        );
        debug!(task = %id, name, ?cadence, "Task registered");
        id
    }

    /// Remove a task by handle. Returns whether it existed.
    pub fn unregister(&mut self, id: TaskId) -> bool {
        let removed = self.tasks.remove(&id).is_some();
        if removed {
            debug!(task = %id, "Task unregistered");
        }
        removed
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task whose cadence fires on `tick`, in registration
    /// order. Returns how many ran.
    pub fn run_due(&mut self, state: &mut S, tick: u64) -> usize {
        let mut ran = 0_usize;
        for task in self.tasks.values_mut() {
            if task.cadence.due(tick) {
                (task.callback)(state, tick);
                ran = ran.saturating_add(1);
            }
        }
        ran
    }
}
