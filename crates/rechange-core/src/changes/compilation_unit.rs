//! Create and delete compilation units

use crate::change::{Change, ChangeBase, ChangeKind};
use crate::error::{ChangeError, Result};
use crate::model::{CompilationUnitHandle, JavaModel};
use crate::progress::ProgressMonitor;
use std::sync::Arc;
use tracing::info;

/// Deletes a compilation unit; its undo recreates it with the captured source
#[derive(Debug)]
pub struct DeleteCompilationUnitChange {
    base: ChangeBase,
    model: Arc<dyn JavaModel>,
    unit: CompilationUnitHandle,
    source: Option<String>,
}

impl DeleteCompilationUnitChange {
    /// Delete `unit` from `model`
    pub fn new(model: Arc<dyn JavaModel>, unit: CompilationUnitHandle) -> Self {
        let name = format!(
            "Delete compilation unit {} from {}",
            unit.name,
            unit.package.display_name()
        );
        DeleteCompilationUnitChange {
            base: ChangeBase::new(name),
            model,
            unit,
            source: None,
        }
    }

    /// The unit to delete
    pub fn unit(&self) -> &CompilationUnitHandle {
        &self.unit
    }

    /// Source captured right before the delete
    pub fn captured_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn delete(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(&format!("Deleting {}", self.unit.name), 1);
        if !self.model.unit_exists(&self.unit) {
            return Err(ChangeError::precondition(format!(
                "{} does not exist",
                self.unit
            )));
        }
        if self.model.is_unit_read_only(&self.unit) {
            return Err(ChangeError::precondition(format!(
                "{} is read-only",
                self.unit
            )));
        }
        let source = self.model.source(&self.unit)?;
        self.source = Some(source.clone());
        self.model.delete_unit(&self.unit)?;
        monitor.worked(1);
        monitor.done();
        info!(unit = %self.unit, "Deleted compilation unit");
        Ok(Box::new(CreateCompilationUnitChange::new(
            Arc::clone(&self.model),
            self.unit.clone(),
            source,
        )))
    }
}

impl Change for DeleteCompilationUnitChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::DeleteCompilationUnit
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.delete(monitor);
        self.base.complete(outcome)
    }
}

/// Creates a compilation unit; its undo deletes it again
#[derive(Debug)]
pub struct CreateCompilationUnitChange {
    base: ChangeBase,
    model: Arc<dyn JavaModel>,
    unit: CompilationUnitHandle,
    source: String,
}

impl CreateCompilationUnitChange {
    /// Create `unit` in `model` with `source`
    pub fn new(
        model: Arc<dyn JavaModel>,
        unit: CompilationUnitHandle,
        source: impl Into<String>,
    ) -> Self {
        let name = format!(
            "Create compilation unit {} in {}",
            unit.name,
            unit.package.display_name()
        );
        CreateCompilationUnitChange {
            base: ChangeBase::new(name),
            model,
            unit,
            source: source.into(),
        }
    }

    /// The unit to create
    pub fn unit(&self) -> &CompilationUnitHandle {
        &self.unit
    }

    /// Source the unit is created with
    pub fn source(&self) -> &str {
        &self.source
    }

    fn create(&self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(&format!("Creating {}", self.unit.name), 1);
        if !self.model.package_exists(&self.unit.package) {
            return Err(ChangeError::precondition(format!(
                "package {} does not exist",
                self.unit.package
            )));
        }
        if self.model.unit_exists(&self.unit) {
            return Err(ChangeError::precondition(format!(
                "{} already exists",
                self.unit
            )));
        }
        self.model.create_unit(&self.unit, &self.source)?;
        monitor.worked(1);
        monitor.done();
        info!(unit = %self.unit, "Created compilation unit");
        Ok(Box::new(DeleteCompilationUnitChange::new(
            Arc::clone(&self.model),
            self.unit.clone(),
        )))
    }
}

impl Change for CreateCompilationUnitChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::CreateCompilationUnit
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.create(monitor);
        self.base.complete(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{perform_change, ChangeState};
    use crate::model::{InMemoryJavaModel, PackageHandle};
    use crate::progress::NullProgressMonitor;

    fn setup() -> (Arc<InMemoryJavaModel>, CompilationUnitHandle) {
        let model = Arc::new(InMemoryJavaModel::new());
        let unit = CompilationUnitHandle::new(PackageHandle::new("src", "p"), "A.java");
        model.add_unit(&unit, "package p;\nclass A {}\n");
        (model, unit)
    }

    #[test]
    fn test_delete_captures_source_and_builds_create() {
        let (model, unit) = setup();
        let mut change = DeleteCompilationUnitChange::new(model.clone(), unit.clone());
        assert_eq!(change.name(), "Delete compilation unit A.java from p");

        let undo = perform_change(&mut change, &mut NullProgressMonitor).unwrap();

        assert!(!model.unit_exists(&unit));
        assert_eq!(change.captured_source(), Some("package p;\nclass A {}\n"));
        assert_eq!(undo.kind(), ChangeKind::CreateCompilationUnit);
        assert_eq!(undo.name(), "Create compilation unit A.java in p");
    }

    #[test]
    fn test_delete_then_undo_restores_unit() {
        let (model, unit) = setup();
        let before = model.snapshot();
        let mut change = DeleteCompilationUnitChange::new(model.clone(), unit);

        let mut undo = perform_change(&mut change, &mut NullProgressMonitor).unwrap();
        // the undo outlives the original change
        drop(change);
        perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();

        assert_eq!(model.snapshot(), before);
    }

    #[test]
    fn test_delete_missing_unit_is_precondition_error() {
        let (model, unit) = setup();
        let missing = CompilationUnitHandle::new(unit.package.clone(), "Missing.java");
        let mut change = DeleteCompilationUnitChange::new(model, missing);
        let result = perform_change(&mut change, &mut NullProgressMonitor);
        assert!(matches!(result, Err(ChangeError::Precondition(_))));
        assert_eq!(change.state(), ChangeState::Failed);
        assert!(change.undo_change().is_none());
    }

    #[test]
    fn test_delete_read_only_unit_is_precondition_error() {
        let (model, unit) = setup();
        model.set_unit_read_only(&unit, true);
        let mut change = DeleteCompilationUnitChange::new(model.clone(), unit.clone());
        let result = perform_change(&mut change, &mut NullProgressMonitor);
        assert!(matches!(result, Err(ChangeError::Precondition(_))));
        assert!(model.unit_exists(&unit));
    }

    #[test]
    fn test_inactive_delete_does_nothing() {
        let (model, unit) = setup();
        let mut change = DeleteCompilationUnitChange::new(model.clone(), unit.clone());
        change.set_active(false);
        let undo = perform_change(&mut change, &mut NullProgressMonitor).unwrap();
        assert!(model.unit_exists(&unit));
        assert_eq!(undo.kind(), ChangeKind::Null);
    }

    #[test]
    fn test_create_existing_unit_is_precondition_error() {
        let (model, unit) = setup();
        let mut change = CreateCompilationUnitChange::new(model, unit, "class A {}");
        let result = perform_change(&mut change, &mut NullProgressMonitor);
        assert!(matches!(result, Err(ChangeError::Precondition(_))));
    }

    #[test]
    fn test_create_in_missing_package_is_precondition_error() {
        let (model, _) = setup();
        let unit = CompilationUnitHandle::new(PackageHandle::new("src", "nope"), "B.java");
        let mut change = CreateCompilationUnitChange::new(model, unit, "class B {}");
        let result = perform_change(&mut change, &mut NullProgressMonitor);
        assert!(matches!(result, Err(ChangeError::Precondition(_))));
    }

    #[test]
    fn test_create_undo_deletes() {
        let (model, unit) = setup();
        let b = CompilationUnitHandle::new(unit.package.clone(), "B.java");
        let mut change = CreateCompilationUnitChange::new(model.clone(), b.clone(), "class B {}");
        assert_eq!(change.source(), "class B {}");
        let mut undo = perform_change(&mut change, &mut NullProgressMonitor).unwrap();
        assert_eq!(model.source(&b).unwrap(), "class B {}");
        assert_eq!(undo.kind(), ChangeKind::DeleteCompilationUnit);
        perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();
        assert!(!model.unit_exists(&b));
    }
}
