//! In-memory Java model

use super::{CompilationUnitHandle, JavaModel, PackageHandle};
use crate::error::{ModelError, ModelResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct PackageEntry {
    read_only: bool,
    units: BTreeMap<String, UnitEntry>,
}

#[derive(Debug, Clone)]
struct UnitEntry {
    source: String,
    read_only: bool,
}

type Roots = BTreeMap<String, BTreeMap<String, PackageEntry>>;

/// Observable state of an [`InMemoryJavaModel`], for comparing before and after
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelSnapshot {
    /// Source folders
    pub roots: BTreeSet<String>,
    /// Every package
    pub packages: BTreeSet<PackageHandle>,
    /// Every unit with its source
    pub units: BTreeMap<CompilationUnitHandle, String>,
}

/// Java model held entirely in memory
///
/// Packages are flat: `p` and `p.q` are independent entries, as in a Java
/// source folder.
#[derive(Debug, Default)]
pub struct InMemoryJavaModel {
    roots: RwLock<Roots>,
}

impl InMemoryJavaModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source folder
    pub fn add_root(&self, root: impl Into<String>) {
        self.roots.write().entry(root.into()).or_default();
    }

    /// Add a package, creating its source folder if needed
    pub fn add_package(&self, package: &PackageHandle) {
        self.roots
            .write()
            .entry(package.root.clone())
            .or_default()
            .entry(package.name.clone())
            .or_default();
    }

    /// Add or replace a unit, creating its package if needed
    pub fn add_unit(&self, unit: &CompilationUnitHandle, source: impl Into<String>) {
        self.roots
            .write()
            .entry(unit.package.root.clone())
            .or_default()
            .entry(unit.package.name.clone())
            .or_default()
            .units
            .insert(
                unit.name.clone(),
                UnitEntry {
                    source: source.into(),
                    read_only: false,
                },
            );
    }

    /// Mark a unit read-only or writable; returns whether the unit exists
    pub fn set_unit_read_only(&self, unit: &CompilationUnitHandle, read_only: bool) -> bool {
        let mut roots = self.roots.write();
        match roots
            .get_mut(&unit.package.root)
            .and_then(|packages| packages.get_mut(&unit.package.name))
            .and_then(|entry| entry.units.get_mut(&unit.name))
        {
            Some(entry) => {
                entry.read_only = read_only;
                true
            }
            None => false,
        }
    }

    /// Mark a package read-only or writable; returns whether the package exists
    pub fn set_package_read_only(&self, package: &PackageHandle, read_only: bool) -> bool {
        let mut roots = self.roots.write();
        match roots
            .get_mut(&package.root)
            .and_then(|packages| packages.get_mut(&package.name))
        {
            Some(entry) => {
                entry.read_only = read_only;
                true
            }
            None => false,
        }
    }

    /// Capture roots, packages and unit sources
    pub fn snapshot(&self) -> ModelSnapshot {
        let roots = self.roots.read();
        let mut snapshot = ModelSnapshot::default();
        for (root, packages) in roots.iter() {
            snapshot.roots.insert(root.clone());
            for (name, entry) in packages {
                let package = PackageHandle::new(root.clone(), name.clone());
                for (unit, unit_entry) in &entry.units {
                    snapshot.units.insert(
                        CompilationUnitHandle::new(package.clone(), unit.clone()),
                        unit_entry.source.clone(),
                    );
                }
                snapshot.packages.insert(package);
            }
        }
        snapshot
    }

    fn with_package<T>(
        &self,
        package: &PackageHandle,
        f: impl FnOnce(&PackageEntry) -> T,
    ) -> Option<T> {
        let roots = self.roots.read();
        roots
            .get(&package.root)
            .and_then(|packages| packages.get(&package.name))
            .map(f)
    }

    fn with_unit<T>(&self, unit: &CompilationUnitHandle, f: impl FnOnce(&UnitEntry) -> T) -> Option<T> {
        self.with_package(&unit.package, |entry| entry.units.get(&unit.name).map(f))
            .flatten()
    }
}

impl JavaModel for InMemoryJavaModel {
    fn root_exists(&self, root: &str) -> bool {
        self.roots.read().contains_key(root)
    }

    fn package_exists(&self, package: &PackageHandle) -> bool {
        self.with_package(package, |_| ()).is_some()
    }

    fn is_package_read_only(&self, package: &PackageHandle) -> bool {
        self.with_package(package, |entry| entry.read_only)
            .unwrap_or(false)
    }

    fn compilation_units(&self, package: &PackageHandle) -> ModelResult<Vec<CompilationUnitHandle>> {
        self.with_package(package, |entry| {
            entry
                .units
                .keys()
                .map(|name| CompilationUnitHandle::new(package.clone(), name.clone()))
                .collect()
        })
        .ok_or_else(|| ModelError::NotFound(package.to_string()))
    }

    fn create_package(&self, package: &PackageHandle) -> ModelResult<()> {
        let mut roots = self.roots.write();
        let packages = roots
            .get_mut(&package.root)
            .ok_or_else(|| ModelError::NotFound(package.root.clone()))?;
        if packages.contains_key(&package.name) {
            return Err(ModelError::AlreadyExists(package.to_string()));
        }
        packages.insert(package.name.clone(), PackageEntry::default());
        debug!(package = %package, "Created package");
        Ok(())
    }

    fn delete_package(&self, package: &PackageHandle) -> ModelResult<()> {
        let mut roots = self.roots.write();
        let packages = roots
            .get_mut(&package.root)
            .ok_or_else(|| ModelError::NotFound(package.to_string()))?;
        let entry = packages
            .get(&package.name)
            .ok_or_else(|| ModelError::NotFound(package.to_string()))?;
        if entry.read_only {
            return Err(ModelError::ReadOnly(package.to_string()));
        }
        if !entry.units.is_empty() {
            return Err(ModelError::NotEmpty(package.to_string()));
        }
        packages.remove(&package.name);
        debug!(package = %package, "Deleted package");
        Ok(())
    }

    fn move_package(
        &self,
        package: &PackageHandle,
        destination_root: &str,
    ) -> ModelResult<PackageHandle> {
        let mut roots = self.roots.write();
        if !roots.contains_key(destination_root) {
            return Err(ModelError::NotFound(destination_root.to_string()));
        }
        let destination = package.in_root(destination_root);
        if roots
            .get(destination_root)
            .is_some_and(|packages| packages.contains_key(&package.name))
        {
            return Err(ModelError::AlreadyExists(destination.to_string()));
        }
        let entry = roots
            .get_mut(&package.root)
            .and_then(|packages| packages.remove(&package.name))
            .ok_or_else(|| ModelError::NotFound(package.to_string()))?;
        roots
            .entry(destination_root.to_string())
            .or_default()
            .insert(package.name.clone(), entry);
        debug!(from = %package, to = %destination, "Moved package");
        Ok(destination)
    }

    fn unit_exists(&self, unit: &CompilationUnitHandle) -> bool {
        self.with_unit(unit, |_| ()).is_some()
    }

    fn is_unit_read_only(&self, unit: &CompilationUnitHandle) -> bool {
        self.with_unit(unit, |entry| entry.read_only).unwrap_or(false)
    }

    fn source(&self, unit: &CompilationUnitHandle) -> ModelResult<String> {
        self.with_unit(unit, |entry| entry.source.clone())
            .ok_or_else(|| ModelError::NotFound(unit.to_string()))
    }

    fn create_unit(&self, unit: &CompilationUnitHandle, source: &str) -> ModelResult<()> {
        let mut roots = self.roots.write();
        let entry = roots
            .get_mut(&unit.package.root)
            .and_then(|packages| packages.get_mut(&unit.package.name))
            .ok_or_else(|| ModelError::NotFound(unit.package.to_string()))?;
        if entry.units.contains_key(&unit.name) {
            return Err(ModelError::AlreadyExists(unit.to_string()));
        }
        entry.units.insert(
            unit.name.clone(),
            UnitEntry {
                source: source.to_string(),
                read_only: false,
            },
        );
        debug!(unit = %unit, "Created compilation unit");
        Ok(())
    }

    fn delete_unit(&self, unit: &CompilationUnitHandle) -> ModelResult<()> {
        let mut roots = self.roots.write();
        let entry = roots
            .get_mut(&unit.package.root)
            .and_then(|packages| packages.get_mut(&unit.package.name))
            .ok_or_else(|| ModelError::NotFound(unit.to_string()))?;
        match entry.units.get(&unit.name) {
            None => return Err(ModelError::NotFound(unit.to_string())),
            Some(existing) if existing.read_only => {
                return Err(ModelError::ReadOnly(unit.to_string()))
            }
            Some(_) => {}
        }
        entry.units.remove(&unit.name);
        debug!(unit = %unit, "Deleted compilation unit");
        Ok(())
    }
}
