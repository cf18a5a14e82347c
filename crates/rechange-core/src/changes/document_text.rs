//! Text edits against a live document

use crate::change::{Change, ChangeBase, ChangeKind};
use crate::document::{apply_edits, DocumentManager, TextEdit};
use crate::error::{ChangeError, ModelError, Result};
use crate::progress::ProgressMonitor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies a set of edits to a document held by a [`DocumentManager`]
///
/// `about_to_perform` connects to the document and `performed` releases it,
/// so the connection is balanced whatever `perform` does. An inactive change
/// never connects.
#[derive(Debug)]
pub struct DocumentTextChange {
    base: ChangeBase,
    manager: Arc<dyn DocumentManager>,
    edits: Vec<TextEdit>,
    connected: bool,
    connect_error: Option<ModelError>,
}

impl DocumentTextChange {
    /// Edit the document of `manager`
    pub fn new(
        name: impl Into<String>,
        manager: Arc<dyn DocumentManager>,
        edits: Vec<TextEdit>,
    ) -> Self {
        DocumentTextChange {
            base: ChangeBase::new(name),
            manager,
            edits,
            connected: false,
            connect_error: None,
        }
    }

    /// Add an edit
    pub fn add_edit(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    /// The edits to apply
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Whether the document is currently connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn edit(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<Box<dyn Change>> {
        monitor.begin_task(self.base.name(), 2);
        if !self.connected {
            let error = self
                .connect_error
                .take()
                .unwrap_or_else(|| ModelError::NotConnected(self.base.name().to_string()));
            return Err(ChangeError::ModelAccess(error));
        }

        let document = self.manager.document()?;
        let inverse = {
            let mut document = document.lock();
            apply_edits(&mut document, &self.edits)?
        };
        monitor.worked(1);

        self.manager.about_to_change();
        if let Err(e) = self.manager.save() {
            warn!(change = %self.base.name(), error = %e, "Save failed, reverting edits");
            apply_edits(&mut document.lock(), &inverse)?;
            return Err(e.into());
        }
        monitor.worked(1);
        monitor.done();
        debug!(change = %self.base.name(), edits = self.edits.len(), "Applied document edits");

        Ok(Box::new(DocumentTextChange::new(
            format!("Undo {}", self.base.name()),
            Arc::clone(&self.manager),
            inverse,
        )))
    }
}

impl Change for DocumentTextChange {
    fn base(&self) -> &ChangeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChangeBase {
        &mut self.base
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::DocumentText
    }

    fn about_to_perform(&mut self) {
        self.base.prepare();
        if self.connected || !self.base.is_active() {
            return;
        }
        match self.manager.connect() {
            Ok(()) => self.connected = true,
            Err(e) => {
                warn!(change = %self.base.name(), error = %e, "Failed to connect to document");
                self.connect_error = Some(e);
            }
        }
    }

    fn perform(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if !self.base.start_perform()? {
            return Ok(());
        }
        let outcome = self.edit(monitor);
        self.base.complete(outcome)
    }

    fn performed(&mut self) {
        if !self.connected {
            return;
        }
        self.manager.changed();
        self.manager.disconnect();
        self.connected = false;
    }
}
