//! Linear undo/redo over whole-document snapshots.
//!
//! `past` holds older snapshots, oldest first. `present` is the last
//! committed snapshot. `future` holds undone snapshots, next redo first.
//! Snapshots are stored by value, so later edits of the live document can
//! never reach into the history.

use std::collections::VecDeque;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    past: VecDeque<T>,
    present: Option<T>,
    future: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            present: None,
            future: VecDeque::new(),
            capacity,
        }
    }

    /// Commit a snapshot. The previous present moves to `past`, the oldest
    /// entry is dropped once over capacity, and the redo branch is discarded.
    pub fn push_state(&mut self, snapshot: &T) {
        if let Some(previous) = self.present.take() {
            self.past.push_back(previous);
            while self.past.len() > self.capacity {
                self.past.pop_front();
            }
        }
        self.present = Some(snapshot.clone());
        self.future.clear();
    }

    /// Step back. Returns the snapshot to install, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<T> {
        let previous = self.past.pop_back()?;
        if let Some(current) = self.present.replace(previous.clone()) {
            self.future.push_front(current);
        }
        Some(previous)
    }

    pub fn redo(&mut self) -> Option<T> {
        let next = self.future.pop_front()?;
        if let Some(current) = self.present.replace(next.clone()) {
            self.past.push_back(current);
        }
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.present = None;
        self.future.clear();
    }

    pub fn present(&self) -> Option<&T> {
        self.present.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
