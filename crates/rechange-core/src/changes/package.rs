//! Create, delete and move packages

use crate::change::{Change, ChangeBase, ChangeKind};
use crate::error::{ChangeError, Result};
use crate::model::{JavaModel, PackageHandle};
use crate::progress::ProgressMonitor;
use std::sync::Arc;
use tracing::info;

/// Moves a package with its units to another source folder
#[derive(Debug)]
pub struct MovePackageChange {
    base: ChangeBase,
    model: Arc<dyn JavaModel>,
    package: PackageHandle,
    destination: String,
}

impl MovePackageChange {
    /// Move `package` into source folder `destination`
    pub fn new(
        model: Arc<dyn JavaModel>,
        package: PackageHandle,
        destination: impl Into<String>,
    ) -> Self {
        let destination = destination.into();
        let name = format!(
            "Move package {} to {}",
            package.display_name(),
            destination
        );
        MovePackageChange {
            base: ChangeBase::new(name),
            model,
            package,
            destination,
        }
    }

    /// The package to move
    pub fn package(&self) -> &PackageHandle {
        &self.package
    }

    /// Destination source folder
    pub fn destination(&self) -> &str {
        &self.destination
    }

    fn check_preconditions(&self) -> Result<()> {
        if !self.model.package_exists(&self.package) {
            return Err(ChangeError::precondition(format!(
                "package {} does not exist",
                self.package
            )));
        }
        if self.model.is_package_read_only(&self.package) {
            return Err(ChangeError::precondition(format!(
                "package {} is read-only",
                self.package
            )));
        }
        if !self.model.root_exists(&self.destination) {
            return Err(ChangeError::precondition(format!(
                "source folder {} does not exist",
                self.destination
            )));
        }
        let target = self.package.in_root(self.destination.clone());
        if self.model.package_exists(&target) {
            return Err(ChangeError::precondition(format!(
                "package {} already exists",
                target
            )));
        }
        Ok(())
    }

    fn relocate(&self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(self.base.name(), 1);
        self.check_preconditions()?;
        let moved = self.model.move_package(&self.package, &self.destination)?;
        monitor.worked(1);
        monitor.done();
        info!(from = %self.package, to = %moved, "Moved package");
        Ok(Box::new(MovePackageChange::new(
            Arc::clone(&self.model),
            moved,
            self.package.root.clone(),
        )))
    }
}

impl Change for MovePackageChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::MovePackage
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.relocate(monitor);
        self.base.complete(outcome)
    }
}

/// Creates an empty package; its undo deletes it
#[derive(Debug)]
pub struct CreatePackageChange {
    base: ChangeBase,
    model: Arc<dyn JavaModel>,
    package: PackageHandle,
}

impl CreatePackageChange {
    /// Create `package` in `model`
    pub fn new(model: Arc<dyn JavaModel>, package: PackageHandle) -> Self {
        let name = format!(
            "Create package {} in {}",
            package.display_name(),
            package.root
        );
        CreatePackageChange {
            base: ChangeBase::new(name),
            model,
            package,
        }
    }

    /// The package to create
    pub fn package(&self) -> &PackageHandle {
        &self.package
    }

    fn create(&self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(self.base.name(), 1);
        if !self.model.root_exists(&self.package.root) {
            return Err(ChangeError::precondition(format!(
                "source folder {} does not exist",
                self.package.root
            )));
        }
        if self.model.package_exists(&self.package) {
            return Err(ChangeError::precondition(format!(
                "package {} already exists",
                self.package
            )));
        }
        self.model.create_package(&self.package)?;
        monitor.worked(1);
        monitor.done();
        info!(package = %self.package, "Created package");
        Ok(Box::new(DeletePackageChange::new(
            Arc::clone(&self.model),
            self.package.clone(),
        )))
    }
}

impl Change for CreatePackageChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::CreatePackage
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.create(monitor);
        self.base.complete(outcome)
    }
}

/// Deletes a package that holds no compilation units; its undo recreates it
#[derive(Debug)]
pub struct DeletePackageChange {
    base: ChangeBase,
    model: Arc<dyn JavaModel>,
    package: PackageHandle,
}

impl DeletePackageChange {
    /// Delete `package` from `model`
    pub fn new(model: Arc<dyn JavaModel>, package: PackageHandle) -> Self {
        let name = format!(
            "Delete package {} from {}",
            package.display_name(),
            package.root
        );
        DeletePackageChange {
            base: ChangeBase::new(name),
            model,
            package,
        }
    }

    /// The package to delete
    pub fn package(&self) -> &PackageHandle {
        &self.package
    }

    fn delete(&self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(self.base.name(), 1);
        if !self.model.package_exists(&self.package) {
            return Err(ChangeError::precondition(format!(
                "package {} does not exist",
                self.package
            )));
        }
        if self.model.is_package_read_only(&self.package) {
            return Err(ChangeError::precondition(format!(
                "package {} is read-only",
                self.package
            )));
        }
        if !self.model.compilation_units(&self.package)?.is_empty() {
            return Err(ChangeError::precondition(format!(
                "package {} still contains compilation units",
                self.package
            )));
        }
        self.model.delete_package(&self.package)?;
        monitor.worked(1);
        monitor.done();
        info!(package = %self.package, "Deleted package");
        Ok(Box::new(CreatePackageChange::new(
            Arc::clone(&self.model),
            self.package.clone(),
        )))
    }
}

impl Change for DeletePackageChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::DeletePackage
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.delete(monitor);
        self.base.complete(outcome)
    }
}
