//! The `Change` capability, its shared state and the perform lifecycle

use crate::error::{ChangeError, Result};
use crate::progress::ProgressMonitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a single change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeState {
    /// Constructed, nothing happened yet
    Unperformed,
    /// `about_to_perform` ran; resources may be acquired
    Preparing,
    /// `perform` is running
    Performing,
    /// `perform` finished and the undo change is available
    Performed,
    /// `perform` returned an error
    Failed,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeState::Unperformed => write!(f, "Unperformed"),
            ChangeState::Preparing => write!(f, "Preparing"),
            ChangeState::Performing => write!(f, "Performing"),
            ChangeState::Performed => write!(f, "Performed"),
            ChangeState::Failed => write!(f, "Failed"),
        }
    }
}

/// The concrete variant behind a `dyn Change`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Does nothing
    Null,
    /// Ordered group of changes
    Composite,
    /// Creates a compilation unit
    CreateCompilationUnit,
    /// Deletes a compilation unit
    DeleteCompilationUnit,
    /// Creates an empty package
    CreatePackage,
    /// Deletes an empty package
    DeletePackage,
    /// Moves a package to another source folder
    MovePackage,
    /// Applies text edits to a document
    DocumentText,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Null => "Null",
            ChangeKind::Composite => "Composite",
            ChangeKind::CreateCompilationUnit => "CreateCompilationUnit",
            ChangeKind::DeleteCompilationUnit => "DeleteCompilationUnit",
            ChangeKind::CreatePackage => "CreatePackage",
            ChangeKind::DeletePackage => "DeletePackage",
            ChangeKind::MovePackage => "MovePackage",
            ChangeKind::DocumentText => "DocumentText",
        };
        write!(f, "{}", name)
    }
}

/// State every change variant carries: identity, name, active flag, lifecycle and undo
#[derive(Debug)]
pub struct ChangeBase {
    id: Uuid,
    name: String,
    active: bool,
    state: ChangeState,
    undo: Option<Box<dyn Change>>,
}

impl ChangeBase {
    /// Create an active, unperformed base
    pub fn new(name: impl Into<String>) -> Self {
        ChangeBase {
            id: Uuid::new_v4(),
            name: name.into(),
            active: true,
            state: ChangeState::Unperformed,
            undo: None,
        }
    }

    /// Unique identifier of this change
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the change will execute
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set the local active flag
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChangeState {
        self.state
    }

    /// Record that `about_to_perform` ran
    pub fn prepare(&mut self) {
        if self.state == ChangeState::Unperformed {
            self.state = ChangeState::Preparing;
        }
    }

    /// Enter `Performing`.
    ///
    /// Returns `Ok(false)` for an inactive change, which is immediately
    /// `Performed` with a [`NullChange`] as its undo.
    pub fn start_perform(&mut self) -> Result<bool> {
        match self.state {
            ChangeState::Unperformed | ChangeState::Preparing => {}
            _ => return Err(ChangeError::AlreadyPerformed(self.name.clone())),
        }
        if !self.active {
            debug!(change = %self.name, "Skipping inactive change");
            self.undo = Some(Box::new(NullChange::new()));
            self.state = ChangeState::Performed;
            return Ok(false);
        }
        self.state = ChangeState::Performing;
        Ok(true)
    }

    /// Finish `perform` with the outcome of the mutation
    pub fn complete(&mut self, outcome: Result<Box<dyn Change>>) -> Result<()> {
        match outcome {
            Ok(undo) => {
                self.undo = Some(undo);
                self.state = ChangeState::Performed;
                Ok(())
            }
            Err(e) => {
                self.state = ChangeState::Failed;
                Err(e)
            }
        }
    }

    /// Mark `perform` as failed without an undo change
    pub fn fail(&mut self) {
        self.state = ChangeState::Failed;
    }

    /// Borrow the undo change, if one was produced
    pub fn undo_change(&self) -> Option<&dyn Change> {
        self.undo.as_deref()
    }

    /// Move the undo change out, leaving none behind
    pub fn take_undo_change(&mut self) -> Option<Box<dyn Change>> {
        self.undo.take()
    }

    pub(crate) fn set_undo_change(&mut self, undo: Box<dyn Change>) {
        self.undo = Some(undo);
    }
}

/// An atomic, reversible mutation against an external entity
///
/// A change goes through `about_to_perform`, `perform` and `performed`
/// exactly once. Use [`perform_change`] or [`PerformGuard`] to drive the
/// lifecycle so that `performed` runs on every exit path.
pub trait Change: fmt::Debug + Send {
    /// Shared state
    fn base(&self) -> &ChangeBase;

    /// Shared state, mutably
    fn base_mut(&mut self) -> &mut ChangeBase;

    /// Which variant this is
    fn kind(&self) -> ChangeKind;

    /// Execute the mutation. Inactive changes return immediately.
    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()>;

    /// Unique identifier
    fn id(&self) -> Uuid {
        self.base().id()
    }

    /// Human-readable name
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Whether this change will execute
    fn is_active(&self) -> bool {
        self.base().is_active()
    }

    /// Activate or deactivate this change
    fn set_active(&mut self, active: bool) {
        self.base_mut().set_active(active);
    }

    /// Lifecycle state
    fn state(&self) -> ChangeState {
        self.base().state()
    }

    /// Setup hook called before `perform`
    fn about_to_perform(&mut self) {
        self.base_mut().prepare();
    }

    /// Teardown hook called after `perform`, whatever its outcome
    fn performed(&mut self) {}

    /// The inverse produced by a successful `perform`
    fn undo_change(&self) -> Option<&dyn Change> {
        self.base().undo_change()
    }

    /// Move the inverse out; a [`NullChange`] if there is none
    fn take_undo_change(&mut self) -> Box<dyn Change> {
        match self.base_mut().take_undo_change() {
            Some(undo) => undo,
            None => Box::new(NullChange::new()),
        }
    }

    /// Sub-changes, in execution order
    fn children(&self) -> &[Box<dyn Change>] {
        &[]
    }
}

/// A change that does nothing; its undo is another `NullChange`
#[derive(Debug)]
pub struct NullChange {
    base: ChangeBase,
}

impl NullChange {
    /// Create a new no-op change
    pub fn new() -> Self {
        NullChange {
            base: ChangeBase::new("No change"),
        }
    }
}

impl Default for NullChange {
    fn default() -> Self {
        Self::new()
    }
}

impl Change for NullChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::Null
    }

    fn perform(&mut self, _monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        self.base.complete(Ok(Box::new(NullChange::new())))
    }
}

/// Serializable snapshot of a change tree, for previews and logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Change name
    pub name: String,
    /// Change variant
    pub kind: ChangeKind,
    /// Active flag
    pub active: bool,
    /// Lifecycle state
    pub state: ChangeState,
    /// Sub-changes in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChangeSummary>,
}

impl ChangeSummary {
    /// Snapshot `change` and its subtree
    pub fn of(change: &dyn Change) -> Self {
        ChangeSummary {
            name: change.name().to_string(),
            kind: change.kind(),
            active: change.is_active(),
            state: change.state(),
            children: change.children().iter().map(|c| Self::of(c.as_ref())).collect(),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let marker = if self.active { "" } else { " (inactive)" };
        writeln!(f, "{}{}{}", "\t".repeat(depth), self.name, marker)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Scoped perform lifecycle: `about_to_perform` on creation, `performed` on drop
pub struct PerformGuard<'a> {
    change: &'a mut dyn Change,
}

impl<'a> PerformGuard<'a> {
    /// Prepare `change` for performing
    pub fn new(change: &'a mut dyn Change) -> Self {
        change.about_to_perform();
        PerformGuard { change }
    }
}

impl<'a> Deref for PerformGuard<'a> {
    type Target = dyn Change + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.change
    }
}

impl<'a> DerefMut for PerformGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.change
    }
}

impl Drop for PerformGuard<'_> {
    fn drop(&mut self) {
        self.change.performed();
    }
}

/// Run the whole lifecycle of `change` and hand back its undo change
pub fn perform_change(
    change: &mut dyn Change,
    monitor: &mut dyn ProgressMonitor,
) -> Result<Box<dyn Change>> {
    debug!(change = %change.name(), kind = %change.kind(), "Performing change");
    let mut guard = PerformGuard::new(change);
    if let Err(e) = guard.perform(monitor) {
        warn!(change = %guard.name(), error = %e, "Change failed");
        return Err(e);
    }
    Ok(guard.take_undo_change())
}
