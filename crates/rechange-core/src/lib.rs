#![warn(missing_docs)]

//! Reversible change trees for Java workspace refactorings
//!
//! A [`Change`] mutates one external entity and, once performed, hands back
//! an undo change that reverses it. [`CompositeChange`] groups changes and
//! undoes them newest first. Leaf changes work against a [`JavaModel`] or a
//! [`DocumentManager`].

pub mod change;
pub mod changes;
pub mod composite;
pub mod config;
pub mod delete;
pub mod document;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod progress;
pub mod text;

// Re-export public API
pub use change::{
    perform_change, Change, ChangeBase, ChangeKind, ChangeState, ChangeSummary, NullChange,
    PerformGuard,
};
pub use changes::{
    CreateCompilationUnitChange, CreatePackageChange, DeleteCompilationUnitChange,
    DeletePackageChange, DocumentTextChange, MovePackageChange,
};
pub use composite::{CompositeChange, FailurePolicy};
pub use config::{ChangeConfig, ConfigLoader, HistoryConfig, LoggingConfig};
pub use delete::{BatchFailure, BatchReport, DeleteOperation, DeleteSupport, ModelDeleteSupport};
pub use document::{apply_edits, Document, DocumentManager, InMemoryDocumentManager, TextEdit};
pub use error::{ChangeError, ModelError, ModelResult, Result};
pub use history::{ChangeHistory, HistoryEntry};
pub use logging::init_logging;
pub use model::{
    CompilationUnitHandle, FileSystemJavaModel, InMemoryJavaModel, JavaElement, JavaModel,
    ModelSnapshot, PackageHandle,
};
pub use progress::{NullProgressMonitor, ProgressMonitor, ProgressTracker, SubProgressMonitor};
