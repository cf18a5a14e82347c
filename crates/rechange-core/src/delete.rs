//! Batch deletion of selected Java elements

use crate::change::{perform_change, Change};
use crate::changes::{DeleteCompilationUnitChange, DeletePackageChange};
use crate::composite::{CompositeChange, FailurePolicy};
use crate::error::{ChangeError, Result};
use crate::model::{JavaElement, JavaModel};
use crate::progress::{ProgressMonitor, SubProgressMonitor};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decides whether elements can be deleted and builds the changes that delete them
pub trait DeleteSupport: Send + Sync + fmt::Debug {
    /// Whether `element` can be deleted right now
    fn can_delete(&self, element: &JavaElement) -> bool;

    /// Build the change deleting `element`
    fn delete_change(&self, element: &JavaElement) -> Result<Box<dyn Change>>;

    /// Depth used to order a batch; deeper elements are deleted first
    fn path_length(&self, element: &JavaElement) -> usize {
        element.path_length()
    }
}

/// Deletes units and packages through a [`JavaModel`]
///
/// A package is deleted as a composite of its unit deletions followed by the
/// package deletion, so its undo recreates the package before its units. The
/// composite rolls its unit deletions back if a later step fails, so a failed
/// package leaves nothing behind for the batch undo to miss.
#[derive(Debug, Clone)]
pub struct ModelDeleteSupport {
    model: Arc<dyn JavaModel>,
}

impl ModelDeleteSupport {
    /// Delete elements of `model`
    pub fn new(model: Arc<dyn JavaModel>) -> Self {
        ModelDeleteSupport { model }
    }
}

impl DeleteSupport for ModelDeleteSupport {
    fn can_delete(&self, element: &JavaElement) -> bool {
        match element {
            JavaElement::CompilationUnit(unit) => {
                self.model.unit_exists(unit) && !self.model.is_unit_read_only(unit)
            }
            JavaElement::Package(package) => {
                if !self.model.package_exists(package)
                    || self.model.is_package_read_only(package)
                    || self.model.has_non_unit_files(package)
                {
                    return false;
                }
                match self.model.compilation_units(package) {
                    Ok(units) => units.iter().all(|unit| !self.model.is_unit_read_only(unit)),
                    Err(_) => false,
                }
            }
        }
    }

    fn delete_change(&self, element: &JavaElement) -> Result<Box<dyn Change>> {
        match element {
            JavaElement::CompilationUnit(unit) => Ok(Box::new(DeleteCompilationUnitChange::new(
                Arc::clone(&self.model),
                unit.clone(),
            ))),
            JavaElement::Package(package) => {
                let mut composite =
                    CompositeChange::new(format!("Delete package {}", package.display_name()))
                        .with_failure_policy(FailurePolicy::RollbackPerformed);
                for unit in self.model.compilation_units(package)? {
                    composite.add_change(Box::new(DeleteCompilationUnitChange::new(
                        Arc::clone(&self.model),
                        unit,
                    )));
                }
                composite.add_change(Box::new(DeletePackageChange::new(
                    Arc::clone(&self.model),
                    package.clone(),
                )));
                Ok(Box::new(composite))
            }
        }
    }
}

/// An element that could not be deleted
#[derive(Debug)]
pub struct BatchFailure {
    /// The element
    pub element: JavaElement,
    /// Why its deletion failed
    pub error: ChangeError,
}

/// Outcome of [`DeleteOperation::run`]
#[derive(Debug)]
pub struct BatchReport {
    /// Reverses every successful deletion, most recent first
    pub undo: CompositeChange,
    /// Elements whose deletion failed, in the order they were attempted
    pub failures: Vec<BatchFailure>,
    /// Whether the batch stopped early on cancellation
    pub cancelled: bool,
}

impl BatchReport {
    /// Whether every element was deleted
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Number of elements deleted
    pub fn deleted(&self) -> usize {
        self.undo.len()
    }
}

/// Deletes a selection of elements with one [`DeleteSupport`] for the whole batch
#[derive(Debug, Clone)]
pub struct DeleteOperation {
    support: Arc<dyn DeleteSupport>,
}

impl DeleteOperation {
    /// Create an operation using `support`
    pub fn new(support: Arc<dyn DeleteSupport>) -> Self {
        DeleteOperation { support }
    }

    /// Whether the selection is non-empty and every element is deletable
    pub fn can_execute(&self, elements: &[JavaElement]) -> bool {
        !elements.is_empty() && elements.iter().all(|e| self.support.can_delete(e))
    }

    /// Delete `elements`, deepest paths first
    ///
    /// Each element is deleted as an independent change; a failure is
    /// recorded and the batch moves on. Cancellation stops the batch before
    /// the next element.
    pub fn run(&self, elements: &[JavaElement], monitor: &mut dyn ProgressMonitor) -> BatchReport {
        let mut ordered: Vec<&JavaElement> = elements.iter().collect();
        ordered.sort_by_key(|e| std::cmp::Reverse(self.support.path_length(e)));

        monitor.begin_task("Deleting elements", ordered.len());
        let mut undos: Vec<Box<dyn Change>> = Vec::new();
        let mut failures = Vec::new();
        let mut cancelled = false;

        for element in ordered {
            if monitor.is_cancelled() {
                info!(deleted = undos.len(), "Delete batch cancelled");
                cancelled = true;
                break;
            }
            monitor.sub_task(&element.to_string());
            let mut sub = SubProgressMonitor::new(&mut *monitor, 1);
            let outcome = self
                .support
                .delete_change(element)
                .and_then(|mut change| perform_change(change.as_mut(), &mut sub));
            sub.done();

            match outcome {
                Ok(undo) => {
                    debug!(element = %element, "Deleted element");
                    undos.push(undo);
                }
                Err(e) => {
                    warn!(element = %element, error = %e, "Failed to delete element");
                    failures.push(BatchFailure {
                        element: element.clone(),
                        error: e,
                    });
                }
            }
        }
        monitor.done();

        undos.reverse();
        BatchReport {
            undo: CompositeChange::from_changes("Undo delete", undos),
            failures,
            cancelled,
        }
    }
}
