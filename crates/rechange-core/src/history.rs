//! Undo/redo history of performed changes

use crate::change::{perform_change, Change};
use crate::config::HistoryConfig;
use crate::error::{ChangeError, Result};
use crate::progress::ProgressMonitor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Represents a single entry in the change history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry identifier
    pub id: Uuid,
    /// Name of the executed change
    pub name: String,
    /// When the change was executed
    pub recorded_at: DateTime<Utc>,
    /// Whether this change is currently undone
    pub is_undone: bool,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(name: impl Into<String>) -> Self {
        HistoryEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            recorded_at: Utc::now(),
            is_undone: false,
        }
    }
}

/// The change to perform next for an entry
#[derive(Debug)]
struct Pending {
    entry: Uuid,
    change: Box<dyn Change>,
}

/// Executes changes and keeps their inverses on undo/redo stacks
///
/// Undoing performs the stored inverse and keeps the inverse's own undo for
/// redo. A failed undo or redo still consumes the entry, since its change
/// may already be partially applied.
#[derive(Debug)]
pub struct ChangeHistory {
    undo_stack: VecDeque<Pending>,
    redo_stack: Vec<Pending>,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl ChangeHistory {
    /// Create a history bounded by `config.limit`
    pub fn new(config: &HistoryConfig) -> Self {
        ChangeHistory {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            entries: Vec::new(),
            limit: config.limit.max(1),
        }
    }

    /// Maximum number of undoable entries
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Perform `change` and record its inverse
    pub fn execute(
        &mut self,
        change: &mut dyn Change,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<HistoryEntry> {
        let undo = perform_change(change, monitor)?;
        let entry = HistoryEntry::new(change.name());
        info!(change = %entry.name, id = %entry.id, "Recorded change");

        self.redo_stack.clear();
        self.entries.retain(|e| !e.is_undone);
        self.entries.push(entry.clone());
        self.push_undo(Pending {
            entry: entry.id,
            change: undo,
        });
        Ok(entry)
    }

    /// Undo the most recent change
    pub fn undo(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<HistoryEntry> {
        let mut pending = self.undo_stack.pop_back().ok_or(ChangeError::NoMoreUndos)?;
        let redo = match perform_change(pending.change.as_mut(), monitor) {
            Ok(redo) => redo,
            Err(e) => {
                warn!(change = %pending.change.name(), error = %e, "Undo failed");
                self.forget(pending.entry);
                return Err(e);
            }
        };

        let entry = self.mark(pending.entry, true)?;
        debug!(change = %entry.name, "Undid change");
        self.redo_stack.push(Pending {
            entry: pending.entry,
            change: redo,
        });
        Ok(entry)
    }

    /// Redo the most recently undone change
    pub fn redo(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<HistoryEntry> {
        let mut pending = self.redo_stack.pop().ok_or(ChangeError::NoMoreRedos)?;
        let undo = match perform_change(pending.change.as_mut(), monitor) {
            Ok(undo) => undo,
            Err(e) => {
                warn!(change = %pending.change.name(), error = %e, "Redo failed");
                self.forget(pending.entry);
                return Err(e);
            }
        };

        let entry = self.mark(pending.entry, false)?;
        debug!(change = %entry.name, "Redid change");
        self.push_undo(Pending {
            entry: pending.entry,
            change: undo,
        });
        Ok(entry)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Name of the change `undo` would revert
    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack
            .back()
            .and_then(|pending| self.entry(pending.entry))
            .map(|entry| entry.name.as_str())
    }

    /// Name of the change `redo` would reapply
    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|pending| self.entry(pending.entry))
            .map(|entry| entry.name.as_str())
    }

    /// Get paginated history, oldest first
    pub fn history(&self, limit: usize, offset: usize) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Look up an entry by id
    pub fn entry(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Get the total number of entries in history
    pub fn total_changes(&self) -> usize {
        self.entries.len()
    }

    /// Get the number of undoable changes
    pub fn undoable_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redoable changes
    pub fn redoable_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.entries.clear();
    }

    fn push_undo(&mut self, pending: Pending) {
        self.undo_stack.push_back(pending);
        while self.undo_stack.len() > self.limit {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(change = %dropped.change.name(), "Dropped oldest history entry");
                self.forget(dropped.entry);
            }
        }
    }

    fn mark(&mut self, id: Uuid, undone: bool) -> Result<HistoryEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ChangeError::precondition(format!("history entry {} not found", id)))?;
        entry.is_undone = undone;
        Ok(entry.clone())
    }

    fn forget(&mut self, id: Uuid) {
        self.entries.retain(|e| e.id != id);
    }
}

impl Default for ChangeHistory {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}
