//! Leaf changes against the Java model and documents

mod compilation_unit;
mod document_text;
mod package;

pub use compilation_unit::{CreateCompilationUnitChange, DeleteCompilationUnitChange};
pub use document_text::DocumentTextChange;
pub use package::{CreatePackageChange, DeletePackageChange, MovePackageChange};
