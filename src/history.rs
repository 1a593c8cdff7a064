//! Undo/redo history.
//!
//! DESIGN
//! ======
//! Applied actions collect in an open batch. Batches nest: `begin_batch` raises
//! the depth and `end_batch` lowers it, and the batch is committed to the undo
//! stack only when the depth returns to zero. Committing a non-empty batch
//! clears the redo stack. Actions applied outside any explicit batch form a
//! batch of their own.
//!
//! Undo pops the newest batch, applies the reverse of each action newest-first
//! and pushes those reversed actions as one batch onto the redo stack. Redo
//! mirrors that. Replayed actions never re-enter the open batch.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use tracing::{debug, warn};

use crate::action::{Action, ActionError, Replay};
use crate::doc::Document;
use crate::item::ItemId;

/// Undo and redo stacks plus the batch being assembled.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Vec<Action>>,
    redo: Vec<Vec<Action>>,
    open: Vec<Action>,
    depth: usize,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or nest into) a batch.
    pub fn begin_batch(&mut self) {
        self.depth += 1;
    }

    /// Close one nesting level. Returns whether a batch was committed.
    pub fn end_batch(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 { self.commit() } else { false }
    }

    /// Current batch nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Apply `action` to `doc` and record it in the open batch.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] from [`Document::run`]; nothing is recorded.
    pub fn apply(&mut self, doc: &mut Document, mut action: Action) -> Result<ItemId, ActionError> {
        let id = doc.run(&mut action)?;
        debug!(kind = ?action.kind, %id, replay = ?action.replay, "action applied");
        if !action.is_replay() {
            self.begin_batch();
            self.open.push(action);
            self.end_batch();
        }
        Ok(id)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of committed batches on the undo stack.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of batches on the redo stack.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// The batch the next undo would revert.
    #[must_use]
    pub fn last_batch(&self) -> Option<&[Action]> {
        self.undo.last().map(Vec::as_slice)
    }

    /// Revert the newest batch. Returns whether there was one.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(batch) = self.undo.pop() else {
            return false;
        };
        let replayed = replay_batch(doc, &batch, Replay::Undo);
        if !replayed.is_empty() {
            self.redo.push(replayed);
        }
        true
    }

    /// Re-apply the newest undone batch. Returns whether there was one.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(batch) = self.redo.pop() else {
            return false;
        };
        let replayed = replay_batch(doc, &batch, Replay::Redo);
        if !replayed.is_empty() {
            self.undo.push(replayed);
        }
        true
    }

    /// Drop both stacks and any open batch.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open.clear();
        self.depth = 0;
    }

    /// Close a batch left open by a gesture that never finished.
    ///
    /// Returns whether anything was committed.
    pub fn flush(&mut self) -> bool {
        if self.depth > 0 {
            warn!(depth = self.depth, pending = self.open.len(), "undo batch left open; closing");
            self.depth = 0;
        }
        self.commit()
    }

    fn commit(&mut self) -> bool {
        if self.open.is_empty() {
            return false;
        }
        self.undo.push(std::mem::take(&mut self.open));
        self.redo.clear();
        true
    }
}

/// Apply the reverse of each action in `batch`, newest first.
fn replay_batch(doc: &mut Document, batch: &[Action], replay: Replay) -> Vec<Action> {
    let mut replayed = Vec::with_capacity(batch.len());
    for action in batch.iter().rev() {
        let Some(mut reverse) = action.reverse() else {
            warn!(kind = ?action.kind, ?replay, "history anomaly: action has no reverse; skipping");
            continue;
        };
        reverse.replay = replay;
        match doc.run(&mut reverse) {
            Ok(id) => {
                debug!(kind = ?reverse.kind, %id, ?replay, "action replayed");
                replayed.push(reverse);
            }
            Err(e) => {
                warn!(kind = ?reverse.kind, ?replay, error = %e, "history anomaly: replay failed; skipping");
            }
        }
    }
    replayed
}
