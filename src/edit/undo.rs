use std::collections::VecDeque;

use super::Action;
use crate::buffer::cursor::Cursor;

/// Fixed-capacity stack: pushing past capacity drops the oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push onto the top, returning the evicted bottom entry if full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One undoable unit plus the cursor on either side of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub action: Action,
    pub cursor_before: Cursor,
    pub cursor_after: Cursor,
}

impl HistoryEntry {
    pub fn new(action: Action, cursor_before: Cursor, cursor_after: Cursor) -> Self {
        Self {
            action,
            cursor_before,
            cursor_after,
        }
    }
}

/// Actions collected between `begin_batch` and `end_batch`
#[derive(Debug, Clone)]
struct PendingBatch {
    actions: Vec<Action>,
    cursor_before: Cursor,
}

/// Undo/redo logs with explicit batch grouping
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: BoundedStack<HistoryEntry>,
    redo: BoundedStack<HistoryEntry>,
    pending: Option<PendingBatch>,
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: BoundedStack::new(capacity),
            redo: BoundedStack::new(capacity),
            pending: None,
        }
    }

    /// Record a freshly performed mutation. Clears the redo log.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();

        if let Some(pending) = self.pending.as_mut() {
            pending.actions.push(entry.action);
            return;
        }

        if let Some(dropped) = self.undo.push(entry) {
            tracing::debug!("undo log full, dropped oldest {}", dropped.action.kind());
        }
    }

    /// Start grouping subsequent records into a single batch entry.
    /// Nested calls extend the already open batch.
    pub fn begin_batch(&mut self, cursor: Cursor) {
        if self.pending.is_none() {
            self.pending = Some(PendingBatch {
                actions: Vec::new(),
                cursor_before: cursor,
            });
        }
    }

    /// Close the open batch and push it as one entry; returns whether
    /// anything was recorded.
    pub fn end_batch(&mut self, cursor: Cursor) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        match Action::group(pending.actions) {
            Some(action) => {
                self.undo
                    .push(HistoryEntry::new(action, pending.cursor_before, cursor));
                true
            }
            None => false,
        }
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Move an undone entry onto the redo log
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    /// Move a redone entry back onto the undo log without touching redo
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending = None;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(crate::config::HISTORY_CAPACITY)
    }
}
