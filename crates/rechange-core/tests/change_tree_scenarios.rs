//! End-to-end scenarios for change trees over the in-memory Java model

use rechange_core::{
    perform_change, Change, ChangeBase, ChangeError, ChangeHistory, ChangeKind, ChangeState,
    CompilationUnitHandle, CompositeChange, CreateCompilationUnitChange, DeleteCompilationUnitChange,
    DocumentTextChange, FailurePolicy, InMemoryDocumentManager, InMemoryJavaModel, JavaModel,
    MovePackageChange, NullProgressMonitor, PackageHandle, ProgressMonitor, ProgressTracker,
    Result, TextEdit,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn package() -> PackageHandle {
    PackageHandle::new("src", "org.example")
}

fn unit(name: &str) -> CompilationUnitHandle {
    CompilationUnitHandle::new(package(), name)
}

fn model_with_units(names: &[&str]) -> Arc<InMemoryJavaModel> {
    let model = Arc::new(InMemoryJavaModel::new());
    for name in names {
        model.add_unit(&unit(name), format!("class {} {{}}\n", name.trim_end_matches(".java")));
    }
    model
}

fn delete(model: &Arc<InMemoryJavaModel>, name: &str) -> Box<dyn Change> {
    Box::new(DeleteCompilationUnitChange::new(model.clone(), unit(name)))
}

fn child_names(change: &dyn Change) -> Vec<String> {
    change
        .children()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

/// Performs the wrapped change, then cancels the token
#[derive(Debug)]
struct CancelAfter {
    inner: Box<dyn Change>,
    token: CancellationToken,
}

impl Change for CancelAfter {
    fn base(&self) -> &ChangeBase {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        self.inner.base_mut()
    }

    fn kind(&self) -> ChangeKind {
        self.inner.kind()
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        let outcome = self.inner.perform(monitor);
        self.token.cancel();
        outcome
    }
}

#[test]
fn test_two_unit_delete_undo_recreates_in_reverse() {
    let model = model_with_units(&["U1.java", "U2.java"]);
    let before = model.snapshot();
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![delete(&model, "U1.java"), delete(&model, "U2.java")],
    );

    let mut undo = perform_change(&mut composite, &mut NullProgressMonitor).unwrap();

    assert!(!model.unit_exists(&unit("U1.java")));
    assert!(!model.unit_exists(&unit("U2.java")));
    assert_eq!(undo.kind(), ChangeKind::Composite);
    assert_eq!(
        child_names(undo.as_ref()),
        vec![
            "Create compilation unit U2.java in org.example",
            "Create compilation unit U1.java in org.example",
        ]
    );

    perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();
    assert_eq!(model.snapshot(), before);
}

#[test]
fn test_inactive_root_has_no_side_effects() {
    let model = model_with_units(&["U1.java", "U2.java"]);
    let before = model.snapshot();
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![delete(&model, "U1.java"), delete(&model, "U2.java")],
    );
    composite.set_active(false);

    let undo = perform_change(&mut composite, &mut NullProgressMonitor).unwrap();

    assert_eq!(undo.kind(), ChangeKind::Null);
    assert_eq!(model.snapshot(), before);
    assert!(composite
        .children()
        .iter()
        .all(|c| c.state() == ChangeState::Preparing));
}

#[test]
fn test_deactivation_reaches_nested_descendants() {
    let model = model_with_units(&["U1.java", "U2.java", "U3.java"]);
    let inner = CompositeChange::from_changes(
        "inner",
        vec![delete(&model, "U2.java"), delete(&model, "U3.java")],
    );
    let mut root =
        CompositeChange::from_changes("root", vec![delete(&model, "U1.java"), Box::new(inner)]);

    root.set_active(false);

    fn all_inactive(change: &dyn Change) -> bool {
        !change.is_active() && change.children().iter().all(|c| all_inactive(c.as_ref()))
    }
    assert!(all_inactive(&root));
}

#[test]
fn test_read_only_child_stops_the_composite() {
    let model = model_with_units(&["U1.java", "U2.java", "U3.java"]);
    model.set_unit_read_only(&unit("U2.java"), true);
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![
            delete(&model, "U1.java"),
            delete(&model, "U2.java"),
            delete(&model, "U3.java"),
        ],
    );

    let result = perform_change(&mut composite, &mut NullProgressMonitor);

    assert!(matches!(result, Err(ChangeError::Precondition(_))));
    assert!(!model.unit_exists(&unit("U1.java")));
    assert!(model.unit_exists(&unit("U2.java")));
    assert!(model.unit_exists(&unit("U3.java")));
    assert!(composite.undo_change().is_none());
    assert_eq!(composite.state(), ChangeState::Failed);
    // the performed child keeps its own undo
    assert!(composite.children()[0].undo_change().is_some());
}

#[test]
fn test_rollback_policy_restores_performed_children() {
    let model = model_with_units(&["U1.java", "U2.java"]);
    let before = model.snapshot();
    model.set_unit_read_only(&unit("U2.java"), true);
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![delete(&model, "U1.java"), delete(&model, "U2.java")],
    )
    .with_failure_policy(FailurePolicy::RollbackPerformed);

    let result = perform_change(&mut composite, &mut NullProgressMonitor);

    assert!(result.is_err());
    assert!(model.unit_exists(&unit("U1.java")));
    model.set_unit_read_only(&unit("U2.java"), false);
    assert_eq!(model.snapshot(), before);
}

#[test]
fn test_cancellation_after_first_child() {
    let model = model_with_units(&["U1.java", "U2.java"]);
    let mut tracker = ProgressTracker::new();
    let first = CancelAfter {
        inner: delete(&model, "U1.java"),
        token: tracker.cancellation_token(),
    };
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![Box::new(first), delete(&model, "U2.java")],
    );

    let result = perform_change(&mut composite, &mut tracker);

    assert!(matches!(result, Err(ChangeError::Cancelled)));
    assert!(!model.unit_exists(&unit("U1.java")));
    assert!(model.unit_exists(&unit("U2.java")));
    assert!(composite.undo_change().is_none());
}

#[test]
fn test_mixed_tree_round_trip() {
    let model = model_with_units(&["A.java"]);
    model.add_root("test");
    let document = Arc::new(InMemoryDocumentManager::new(
        "B.java",
        "class B {\n    int a;\n}\n",
    ));
    let before = model.snapshot();

    let create = CreateCompilationUnitChange::new(model.clone(), unit("B.java"), "class B {}\n");
    let edit = DocumentTextChange::new(
        "Rename field",
        document.clone(),
        vec![TextEdit::replace(18, 1, "count")],
    );
    let relocate = MovePackageChange::new(model.clone(), package(), "test");
    let mut root = CompositeChange::from_changes(
        "Refactor",
        vec![Box::new(create), Box::new(edit), Box::new(relocate)],
    );

    let mut tracker = ProgressTracker::new();
    let mut undo = perform_change(&mut root, &mut tracker).unwrap();

    assert!(tracker.is_finished());
    assert!((tracker.fraction() - 1.0).abs() < f64::EPSILON);
    assert!(model.unit_exists(&CompilationUnitHandle::new(
        package().in_root("test"),
        "B.java"
    )));
    assert_eq!(document.text(), "class B {\n    int count;\n}\n");
    assert_eq!(document.connection_count(), 0);

    perform_change(undo.as_mut(), &mut NullProgressMonitor).unwrap();

    assert_eq!(model.snapshot(), before);
    assert_eq!(document.text(), "class B {\n    int a;\n}\n");
    assert_eq!(document.connection_count(), 0);
}

#[test]
fn test_history_undo_redo_of_composite() {
    let model = model_with_units(&["U1.java", "U2.java"]);
    let before = model.snapshot();
    let mut history = ChangeHistory::default();
    let mut composite = CompositeChange::from_changes(
        "Delete units",
        vec![delete(&model, "U1.java"), delete(&model, "U2.java")],
    );

    history
        .execute(&mut composite, &mut NullProgressMonitor)
        .unwrap();
    let after = model.snapshot();

    history.undo(&mut NullProgressMonitor).unwrap();
    assert_eq!(model.snapshot(), before);

    history.redo(&mut NullProgressMonitor).unwrap();
    assert_eq!(model.snapshot(), after);

    history.undo(&mut NullProgressMonitor).unwrap();
    assert_eq!(model.snapshot(), before);
}

#[test]
fn test_second_perform_is_rejected() {
    let model = model_with_units(&["U1.java"]);
    let mut change = DeleteCompilationUnitChange::new(model.clone(), unit("U1.java"));
    perform_change(&mut change, &mut NullProgressMonitor).unwrap();

    let again = perform_change(&mut change, &mut NullProgressMonitor);
    assert!(matches!(again, Err(ChangeError::AlreadyPerformed(_))));
}
