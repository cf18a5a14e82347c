//! Property-based tests: performing a change tree and then its undo restores
//! the state the tree started from.

use proptest::prelude::*;
use rechange_core::{
    perform_change, Change, ChangeHistory, CompilationUnitHandle, CompositeChange,
    DeleteCompilationUnitChange, DeleteOperation, DocumentTextChange, InMemoryDocumentManager,
    InMemoryJavaModel, JavaElement, ModelDeleteSupport, NullProgressMonitor, PackageHandle,
    TextEdit,
};
use std::sync::Arc;

const PACKAGES: [&str; 3] = ["a", "a.b", "c"];

/// A model with a few units per package and the list of all units
fn populated_model(units_per_package: usize) -> (Arc<InMemoryJavaModel>, Vec<CompilationUnitHandle>) {
    let model = Arc::new(InMemoryJavaModel::new());
    let mut units = Vec::new();
    for package in PACKAGES {
        for i in 0..units_per_package {
            let unit =
                CompilationUnitHandle::new(PackageHandle::new("src", package), format!("U{}.java", i));
            model.add_unit(&unit, format!("package {};\nclass U{} {{}}\n", package, i));
            units.push(unit);
        }
    }
    (model, units)
}

/// A document plus non-overlapping edits against it
fn document_and_edits() -> impl Strategy<Value = (String, Vec<TextEdit>)> {
    "[a-z ;{}\n]{10,80}"
        .prop_flat_map(|text| {
            let len = text.len();
            (
                Just(text),
                prop::collection::btree_set(0..=len, 0..8),
                prop::collection::vec("[A-Za-z0-9 ;]{0,6}", 4),
            )
        })
        .prop_map(|(text, points, replacements)| {
            let points: Vec<usize> = points.into_iter().collect();
            let edits = points
                .chunks(2)
                .zip(replacements)
                .map(|(pair, replacement)| {
                    let start = pair[0];
                    let end = pair.get(1).copied().unwrap_or(start);
                    TextEdit::replace(start, end - start, replacement)
                })
                .collect();
            (text, edits)
        })
}

proptest! {
    /// Deleting any subset of units and undoing restores the model exactly
    #[test]
    fn prop_delete_subset_round_trip(
        units_per_package in 1usize..4,
        selection in prop::collection::vec(any::<bool>(), 12),
    ) {
        let (model, units) = populated_model(units_per_package);
        let before = model.snapshot();

        let children: Vec<Box<dyn Change>> = units
            .iter()
            .zip(selection.iter())
            .filter(|(_, selected)| **selected)
            .map(|(unit, _)| {
                Box::new(DeleteCompilationUnitChange::new(model.clone(), unit.clone()))
                    as Box<dyn Change>
            })
            .collect();
        let deleted = children.len();
        let mut composite = CompositeChange::from_changes("Delete selection", children);

        let mut undo = perform_change(&mut composite, &mut NullProgressMonitor).unwrap();
        prop_assert_eq!(undo.children().len(), deleted);
        prop_assert_eq!(
            model.snapshot().units.len(),
            before.units.len() - deleted
        );

        perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();
        prop_assert_eq!(model.snapshot(), before);
    }

    /// A batch delete of units and packages is reversed by its undo
    #[test]
    fn prop_batch_delete_round_trip(
        units_per_package in 0usize..3,
        picks in prop::collection::vec((any::<bool>(), 0usize..3, 0usize..3), 1..5),
    ) {
        let (model, _) = populated_model(units_per_package);
        let before = model.snapshot();
        let operation = DeleteOperation::new(Arc::new(ModelDeleteSupport::new(model.clone())));

        let mut elements: Vec<JavaElement> = Vec::new();
        for (pick_package, package_index, unit_index) in picks {
            let package = PackageHandle::new("src", PACKAGES[package_index]);
            let element: JavaElement = if pick_package {
                package.into()
            } else {
                CompilationUnitHandle::new(package, format!("U{}.java", unit_index)).into()
            };
            if !elements.contains(&element) {
                elements.push(element);
            }
        }

        let report = operation.run(&elements, &mut NullProgressMonitor);
        prop_assert_eq!(report.deleted() + report.failures.len(), elements.len());

        let mut undo = report.undo;
        perform_change(&mut undo, &mut NullProgressMonitor).unwrap();
        prop_assert_eq!(model.snapshot(), before);
    }

    /// Any set of non-overlapping edits is reversed by the undo change
    #[test]
    fn prop_document_edits_round_trip((text, edits) in document_and_edits()) {
        let manager = Arc::new(InMemoryDocumentManager::new("A.java", text.clone()));
        let mut change = DocumentTextChange::new("Edit", manager.clone(), edits);

        let mut undo = perform_change(&mut change, &mut NullProgressMonitor).unwrap();
        let edited = manager.text();
        prop_assert_eq!(manager.saved_text(), Some(edited.clone()));

        let mut redo = perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();
        prop_assert_eq!(manager.text(), text);

        perform_change(redo.as_mut(), &mut NullProgressMonitor).unwrap();
        prop_assert_eq!(manager.text(), edited);
        prop_assert_eq!(manager.connection_count(), 0);
    }

    /// Undoing everything and redoing everything walks the history back and forth
    #[test]
    fn prop_history_undo_redo_consistency(
        picks in prop::collection::vec(0usize..6, 1..6),
    ) {
        let (model, units) = populated_model(2);
        let initial = model.snapshot();
        let mut history = ChangeHistory::default();

        let mut executed = 0;
        for index in picks {
            let mut change = DeleteCompilationUnitChange::new(model.clone(), units[index].clone());
            if history.execute(&mut change, &mut NullProgressMonitor).is_ok() {
                executed += 1;
            }
        }
        let latest = model.snapshot();
        prop_assert_eq!(history.undoable_count(), executed);

        while history.can_undo() {
            history.undo(&mut NullProgressMonitor).unwrap();
        }
        prop_assert_eq!(model.snapshot(), initial);
        prop_assert_eq!(history.redoable_count(), executed);

        while history.can_redo() {
            history.redo(&mut NullProgressMonitor).unwrap();
        }
        prop_assert_eq!(model.snapshot(), latest);
        prop_assert!(!history.can_redo());
    }
}
