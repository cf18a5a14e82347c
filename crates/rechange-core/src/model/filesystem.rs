//! Java model backed by directories and files under a workspace root

use super::{CompilationUnitHandle, JavaModel, PackageHandle};
use crate::error::{ModelError, ModelResult};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const UNIT_EXTENSION: &str = "java";

/// Files and sub-directories directly inside a directory
#[derive(Debug, Default)]
struct DirContents {
    files: Vec<PathBuf>,
    dirs: usize,
}

impl DirContents {
    fn read(dir: &Path) -> ModelResult<Self> {
        let mut contents = DirContents::default();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                contents.dirs += 1;
            } else {
                contents.files.push(path);
            }
        }
        contents.files.sort();
        Ok(contents)
    }
}

/// Source folders are directories, packages nested directories, units `.java` files
///
/// A directory is a package when it holds files, is empty, or was made a
/// package through this model. A directory holding nothing but sub-package
/// directories is only a container, so moving `p.q` does not make `p` a
/// package. Read-only state comes from file permissions.
#[derive(Debug)]
pub struct FileSystemJavaModel {
    workspace: PathBuf,
    known: RwLock<HashSet<PathBuf>>,
}

impl FileSystemJavaModel {
    /// Model the workspace rooted at `workspace`
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        FileSystemJavaModel {
            workspace: workspace.into(),
            known: RwLock::new(HashSet::new()),
        }
    }

    /// Workspace root directory
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Directory of a source folder
    pub fn root_path(&self, root: &str) -> PathBuf {
        self.workspace.join(root)
    }

    /// Directory of a package
    pub fn package_path(&self, package: &PackageHandle) -> PathBuf {
        let mut path = self.root_path(&package.root);
        for segment in package.segments() {
            path.push(segment);
        }
        path
    }

    /// File of a compilation unit
    pub fn unit_path(&self, unit: &CompilationUnitHandle) -> PathBuf {
        self.package_path(&unit.package).join(&unit.name)
    }

    fn is_read_only(path: &Path) -> bool {
        fs::metadata(path)
            .map(|metadata| metadata.permissions().readonly())
            .unwrap_or(false)
    }

    fn is_unit_file(path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(UNIT_EXTENSION)
    }

    /// Remove `dir` and then its ancestors while they are empty, stopping at the source folder
    fn remove_empty_dirs(&self, package: &PackageHandle, dir: &Path) {
        let root = self.root_path(&package.root);
        let known = self.known.read();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path == root || !path.starts_with(&root) || known.contains(path) {
                break;
            }
            let empty = fs::read_dir(path)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !empty {
                break;
            }
            if let Err(e) = fs::remove_dir(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove empty directory");
                break;
            }
            debug!(path = %path.display(), "Removed empty directory");
            current = path.parent();
        }
    }
}

impl JavaModel for FileSystemJavaModel {
    fn root_exists(&self, root: &str) -> bool {
        self.root_path(root).is_dir()
    }

    fn package_exists(&self, package: &PackageHandle) -> bool {
        let dir = self.package_path(package);
        if !dir.is_dir() {
            return false;
        }
        if self.known.read().contains(&dir) {
            return true;
        }
        DirContents::read(&dir)
            .map(|contents| !contents.files.is_empty() || contents.dirs == 0)
            .unwrap_or(false)
    }

    fn is_package_read_only(&self, package: &PackageHandle) -> bool {
        Self::is_read_only(&self.package_path(package))
    }

    fn compilation_units(&self, package: &PackageHandle) -> ModelResult<Vec<CompilationUnitHandle>> {
        if !self.package_exists(package) {
            return Err(ModelError::NotFound(package.to_string()));
        }
        let units = DirContents::read(&self.package_path(package))?
            .files
            .into_iter()
            .filter(|path| Self::is_unit_file(path))
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| CompilationUnitHandle::new(package.clone(), name))
            })
            .collect();
        Ok(units)
    }

    fn has_non_unit_files(&self, package: &PackageHandle) -> bool {
        DirContents::read(&self.package_path(package))
            .map(|contents| contents.files.iter().any(|path| !Self::is_unit_file(path)))
            .unwrap_or(false)
    }

    fn create_package(&self, package: &PackageHandle) -> ModelResult<()> {
        if !self.root_exists(&package.root) {
            return Err(ModelError::NotFound(package.root.clone()));
        }
        if self.package_exists(package) {
            return Err(ModelError::AlreadyExists(package.to_string()));
        }
        let dir = self.package_path(package);
        fs::create_dir_all(&dir)?;
        self.known.write().insert(dir.clone());
        debug!(path = %dir.display(), "Created package directory");
        Ok(())
    }

    fn delete_package(&self, package: &PackageHandle) -> ModelResult<()> {
        if !self.package_exists(package) {
            return Err(ModelError::NotFound(package.to_string()));
        }
        let dir = self.package_path(package);
        if Self::is_read_only(&dir) {
            return Err(ModelError::ReadOnly(package.to_string()));
        }
        let contents = DirContents::read(&dir)?;
        if !contents.files.is_empty() {
            return Err(ModelError::NotEmpty(package.to_string()));
        }
        self.known.write().remove(&dir);
        if contents.dirs == 0 {
            self.remove_empty_dirs(package, &dir);
            debug!(path = %dir.display(), "Deleted package directory");
        } else {
            // sub-packages keep the directory as a plain container
            debug!(path = %dir.display(), "Deleted package, directory kept for sub-packages");
        }
        Ok(())
    }

    fn move_package(
        &self,
        package: &PackageHandle,
        destination_root: &str,
    ) -> ModelResult<PackageHandle> {
        if !self.root_exists(destination_root) {
            return Err(ModelError::NotFound(destination_root.to_string()));
        }
        if !self.package_exists(package) {
            return Err(ModelError::NotFound(package.to_string()));
        }
        let destination = package.in_root(destination_root);
        if self.package_exists(&destination) {
            return Err(ModelError::AlreadyExists(destination.to_string()));
        }

        let source_dir = self.package_path(package);
        let target_dir = self.package_path(&destination);
        fs::create_dir_all(&target_dir)?;
        // sub-packages are packages of their own and stay behind
        for file in DirContents::read(&source_dir)?.files {
            if let Some(name) = file.file_name() {
                fs::rename(&file, target_dir.join(name))?;
            }
        }
        {
            let mut known = self.known.write();
            known.remove(&source_dir);
            known.insert(target_dir);
        }
        self.remove_empty_dirs(package, &source_dir);
        debug!(from = %package, to = %destination, "Moved package directory");
        Ok(destination)
    }

    fn unit_exists(&self, unit: &CompilationUnitHandle) -> bool {
        self.unit_path(unit).is_file()
    }

    fn is_unit_read_only(&self, unit: &CompilationUnitHandle) -> bool {
        Self::is_read_only(&self.unit_path(unit))
    }

    fn source(&self, unit: &CompilationUnitHandle) -> ModelResult<String> {
        let path = self.unit_path(unit);
        if !path.is_file() {
            return Err(ModelError::NotFound(unit.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    fn create_unit(&self, unit: &CompilationUnitHandle, source: &str) -> ModelResult<()> {
        if !self.package_exists(&unit.package) {
            return Err(ModelError::NotFound(unit.package.to_string()));
        }
        let path = self.unit_path(unit);
        if path.exists() {
            return Err(ModelError::AlreadyExists(unit.to_string()));
        }
        fs::write(&path, source)?;
        debug!(path = %path.display(), "Created compilation unit file");
        Ok(())
    }

    fn delete_unit(&self, unit: &CompilationUnitHandle) -> ModelResult<()> {
        let path = self.unit_path(unit);
        if !path.is_file() {
            return Err(ModelError::NotFound(unit.to_string()));
        }
        if Self::is_read_only(&path) {
            return Err(ModelError::ReadOnly(unit.to_string()));
        }
        fs::remove_file(&path)?;
        // the package outlives its last unit even beside sub-packages
        self.known
            .write()
            .insert(self.package_path(&unit.package));
        debug!(path = %path.display(), "Deleted compilation unit file");
        Ok(())
    }
}
