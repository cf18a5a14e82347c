//! Handles to Java elements and the model-access collaborator that mutates them

mod filesystem;
mod memory;

pub use filesystem::FileSystemJavaModel;
pub use memory::{InMemoryJavaModel, ModelSnapshot};

use crate::error::ModelResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A package inside a source folder; an empty name is the default package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageHandle {
    /// Source folder, relative to the workspace (e.g. `src/main/java`)
    pub root: String,
    /// Dotted package name
    pub name: String,
}

impl PackageHandle {
    /// Create a handle for `name` in source folder `root`
    pub fn new(root: impl Into<String>, name: impl Into<String>) -> Self {
        PackageHandle {
            root: root.into(),
            name: name.into(),
        }
    }

    /// Whether this is the default (unnamed) package
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Name for messages
    pub fn display_name(&self) -> &str {
        if self.is_default() {
            "(default package)"
        } else {
            &self.name
        }
    }

    /// Package name split at dots
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.').filter(|s| !s.is_empty())
    }

    /// The same package in another source folder
    pub fn in_root(&self, root: impl Into<String>) -> Self {
        PackageHandle::new(root, self.name.clone())
    }

    /// Segment count of the package's path in the workspace
    pub fn path_length(&self) -> usize {
        root_segments(&self.root) + self.segments().count()
    }

    /// Workspace-relative path of the package directory
    pub fn relative_path(&self) -> String {
        let mut parts: Vec<&str> = self.root.split('/').filter(|s| !s.is_empty()).collect();
        parts.extend(self.segments());
        parts.join("/")
    }
}

impl fmt::Display for PackageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.root, self.display_name())
    }
}

/// A compilation unit (source file) inside a package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompilationUnitHandle {
    /// Enclosing package
    pub package: PackageHandle,
    /// File name, e.g. `Foo.java`
    pub name: String,
}

impl CompilationUnitHandle {
    /// Create a handle for unit `name` in `package`
    pub fn new(package: PackageHandle, name: impl Into<String>) -> Self {
        CompilationUnitHandle {
            package,
            name: name.into(),
        }
    }

    /// Segment count of the unit's path in the workspace
    pub fn path_length(&self) -> usize {
        self.package.path_length() + 1
    }

    /// Workspace-relative path of the unit's file
    pub fn relative_path(&self) -> String {
        let dir = self.package.relative_path();
        if dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", dir, self.name)
        }
    }
}

impl fmt::Display for CompilationUnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path())
    }
}

/// An element a user can select for deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaElement {
    /// A source file
    CompilationUnit(CompilationUnitHandle),
    /// A package
    Package(PackageHandle),
}

impl JavaElement {
    /// Segment count of the element's path in the workspace
    pub fn path_length(&self) -> usize {
        match self {
            JavaElement::CompilationUnit(unit) => unit.path_length(),
            JavaElement::Package(package) => package.path_length(),
        }
    }
}

impl fmt::Display for JavaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaElement::CompilationUnit(unit) => write!(f, "{}", unit),
            JavaElement::Package(package) => write!(f, "{}", package),
        }
    }
}

impl From<CompilationUnitHandle> for JavaElement {
    fn from(unit: CompilationUnitHandle) -> Self {
        JavaElement::CompilationUnit(unit)
    }
}

impl From<PackageHandle> for JavaElement {
    fn from(package: PackageHandle) -> Self {
        JavaElement::Package(package)
    }
}

fn root_segments(root: &str) -> usize {
    root.split('/').filter(|s| !s.is_empty()).count()
}

/// Access to the store of source folders, packages and compilation units
///
/// Query methods answer `false` for elements that cannot be inspected.
/// Mutations report failures as [`crate::error::ModelError`].
pub trait JavaModel: Send + Sync + fmt::Debug {
    /// Whether the source folder exists
    fn root_exists(&self, root: &str) -> bool;

    /// Whether the package exists
    fn package_exists(&self, package: &PackageHandle) -> bool;

    /// Whether the package refuses modification
    fn is_package_read_only(&self, package: &PackageHandle) -> bool;

    /// Compilation units directly inside the package, sorted by name
    fn compilation_units(&self, package: &PackageHandle) -> ModelResult<Vec<CompilationUnitHandle>>;

    /// Whether the package holds files other than compilation units
    ///
    /// Such files keep a package from being deleted.
    fn has_non_unit_files(&self, _package: &PackageHandle) -> bool {
        false
    }

    /// Create an empty package
    fn create_package(&self, package: &PackageHandle) -> ModelResult<()>;

    /// Delete a package without compilation units
    fn delete_package(&self, package: &PackageHandle) -> ModelResult<()>;

    /// Move a package with its units to another source folder
    fn move_package(
        &self,
        package: &PackageHandle,
        destination_root: &str,
    ) -> ModelResult<PackageHandle>;

    /// Whether the compilation unit exists
    fn unit_exists(&self, unit: &CompilationUnitHandle) -> bool;

    /// Whether the compilation unit refuses modification
    fn is_unit_read_only(&self, unit: &CompilationUnitHandle) -> bool;

    /// Full source text of the unit
    fn source(&self, unit: &CompilationUnitHandle) -> ModelResult<String>;

    /// Create the unit with `source`
    fn create_unit(&self, unit: &CompilationUnitHandle, source: &str) -> ModelResult<()>;

    /// Delete the unit
    fn delete_unit(&self, unit: &CompilationUnitHandle) -> ModelResult<()>;
}
