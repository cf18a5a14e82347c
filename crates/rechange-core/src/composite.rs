//! Ordered, reversible groups of changes

use crate::change::{perform_change, Change, ChangeBase, ChangeKind, ChangeSummary};
use crate::error::{ChangeError, Result};
use crate::progress::{NullProgressMonitor, ProgressMonitor, SubProgressMonitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// What a composite does when one of its children fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and leave performed children applied
    #[default]
    FailFast,
    /// Stop at the first failure and undo the performed children, newest first
    RollbackPerformed,
}

/// A change made of other changes, performed in insertion order
///
/// After a successful `perform` the undo change is a new composite holding
/// the children's undo changes in reverse order, so undoing replays them
/// newest first.
#[derive(Debug)]
pub struct CompositeChange {
    base: ChangeBase,
    changes: Vec<Box<dyn Change>>,
    failure_policy: FailurePolicy,
}

impl CompositeChange {
    /// Create an empty composite
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_changes(name, Vec::new())
    }

    /// Create a composite over existing changes
    pub fn from_changes(name: impl Into<String>, changes: Vec<Box<dyn Change>>) -> Self {
        CompositeChange {
            base: ChangeBase::new(name),
            changes,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Use `policy` when a child fails
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// The policy applied when a child fails
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Append a child; it runs after all existing children
    pub fn add_change(&mut self, change: Box<dyn Change>) {
        self.changes.push(change);
    }

    /// Builder form of [`CompositeChange::add_change`]
    pub fn with_change(mut self, change: Box<dyn Change>) -> Self {
        self.add_change(change);
        self
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the composite has no children
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Snapshot of this composite's tree
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::of(self)
    }

    fn perform_children(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        let total = self.changes.len();
        monitor.begin_task(self.base.name(), total);
        for index in 0..total {
            if monitor.is_cancelled() {
                info!(
                    composite = %self.base.name(),
                    performed = index,
                    total,
                    "Composite change cancelled"
                );
                // performed children stay applied whatever the policy
                return Err(ChangeError::Cancelled);
            }
            let child = &mut self.changes[index];
            let outcome = {
                let mut sub = SubProgressMonitor::new(&mut *monitor, 1);
                let outcome = child.perform(&mut sub);
                sub.done();
                outcome
            };
            if let Err(e) = outcome {
                debug!(
                    composite = %self.base.name(),
                    child = %self.changes[index].name(),
                    error = %e,
                    "Child change failed"
                );
                self.handle_failure(index);
                return Err(e);
            }
        }
        monitor.done();
        Ok(())
    }

    /// Applies the failure policy to the first `performed` children after a child error
    fn handle_failure(&mut self, performed: usize) {
        if self.failure_policy != FailurePolicy::RollbackPerformed {
            return;
        }
        for child in self.changes[..performed].iter_mut().rev() {
            let mut undo = child.take_undo_change();
            if let Err(e) = perform_change(undo.as_mut(), &mut NullProgressMonitor) {
                warn!(
                    composite = %self.base.name(),
                    child = %child.name(),
                    error = %e,
                    "Rollback of performed child failed"
                );
            }
        }
    }

    fn collect_undo(&mut self) -> Box<dyn Change> {
        let undo_list: Vec<Box<dyn Change>> = self
            .changes
            .iter_mut()
            .rev()
            .map(|child| child.take_undo_change())
            .collect();
        Box::new(CompositeChange::from_changes(
            format!("Undo {}", self.base.name()),
            undo_list,
        ))
    }
}

impl Change for CompositeChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::Composite
    }

    fn about_to_perform(&mut self) {
        self.base.prepare();
        for change in &mut self.changes {
            change.about_to_perform();
        }
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        match self.perform_children(monitor) {
            Ok(()) => {
                let undo = self.collect_undo();
                self.base.complete(Ok(undo))
            }
            Err(e) => {
                self.base.fail();
                Err(e)
            }
        }
    }

    fn performed(&mut self) {
        for change in &mut self.changes {
            change.performed();
        }
    }

    /// Sets the flag on this composite and on every descendant
    fn set_active(&mut self, active: bool) {
        self.base.set_active(active);
        for change in &mut self.changes {
            change.set_active(active);
        }
    }

    fn children(&self) -> &[Box<dyn Change>] {
        &self.changes
    }
}

impl fmt::Display for CompositeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
