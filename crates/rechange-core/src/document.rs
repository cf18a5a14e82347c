//! Text documents, edits and the document-manager collaborator

use crate::error::{ChangeError, ModelError, ModelResult, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A text buffer addressed by byte offsets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    /// Create a document holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        Document { text: text.into() }
    }

    /// Whole content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the document is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text in `offset..offset + length`
    pub fn get(&self, offset: usize, length: usize) -> ModelResult<&str> {
        self.check_range(offset, length)?;
        Ok(&self.text[offset..offset + length])
    }

    /// Replace `offset..offset + length` with `text`, returning the replaced text
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> ModelResult<String> {
        self.check_range(offset, length)?;
        let end = offset + length;
        let replaced = self.text[offset..end].to_string();
        self.text.replace_range(offset..end, text);
        Ok(replaced)
    }

    /// Number of lines; a trailing newline does not start a new line
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Line `index` without its terminator
    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.lines().nth(index)
    }

    fn check_range(&self, offset: usize, length: usize) -> ModelResult<()> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| ModelError::InvalidEdit(format!("range {}+{} overflows", offset, length)))?;
        if end > self.text.len() {
            return Err(ModelError::InvalidEdit(format!(
                "range {}..{} exceeds document length {}",
                offset,
                end,
                self.text.len()
            )));
        }
        if !self.text.is_char_boundary(offset) || !self.text.is_char_boundary(end) {
            return Err(ModelError::InvalidEdit(format!(
                "range {}..{} splits a character",
                offset, end
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Replace `length` bytes at `offset` with `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Byte offset where the edit starts
    pub offset: usize,
    /// Number of bytes replaced
    pub length: usize,
    /// Replacement text
    pub text: String,
}

impl TextEdit {
    /// Replace a range
    pub fn replace(offset: usize, length: usize, text: impl Into<String>) -> Self {
        TextEdit {
            offset,
            length,
            text: text.into(),
        }
    }

    /// Insert text
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, 0, text)
    }

    /// Delete a range
    pub fn delete(offset: usize, length: usize) -> Self {
        Self::replace(offset, length, "")
    }

    /// End of the replaced range
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Apply `edits` (all relative to the current content) and return their inverse
///
/// Edits must lie inside the document, on character boundaries, and must not
/// overlap. The returned edits are relative to the edited content and, applied
/// to it, restore the original text.
pub fn apply_edits(document: &mut Document, edits: &[TextEdit]) -> Result<Vec<TextEdit>> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| edit.offset);

    let mut previous_end = 0;
    for edit in &sorted {
        document
            .get(edit.offset, edit.length)
            .map_err(|e| ChangeError::precondition(e.to_string()))?;
        if edit.offset < previous_end {
            return Err(ChangeError::precondition(format!(
                "edit at {} overlaps the previous edit ending at {}",
                edit.offset, previous_end
            )));
        }
        previous_end = edit.end();
    }

    let mut replaced = vec![String::new(); sorted.len()];
    for (index, edit) in sorted.iter().enumerate().rev() {
        replaced[index] = document.replace(edit.offset, edit.length, &edit.text)?;
    }

    let mut inverse = Vec::with_capacity(sorted.len());
    let mut delta: isize = 0;
    for (edit, original) in sorted.iter().zip(replaced) {
        let offset = (edit.offset as isize + delta) as usize;
        inverse.push(TextEdit::replace(offset, edit.text.len(), original));
        delta += edit.text.len() as isize - edit.length as isize;
    }
    Ok(inverse)
}

/// Grants exclusive editing access to a live document
///
/// Callers pair `connect` with `disconnect`; `document` is only available
/// while connected.
pub trait DocumentManager: Send + Sync + fmt::Debug {
    /// Acquire the document
    fn connect(&self) -> ModelResult<()>;

    /// Release the document
    fn disconnect(&self);

    /// The connected document
    fn document(&self) -> ModelResult<Arc<Mutex<Document>>>;

    /// Called before the document is saved
    fn about_to_change(&self) {}

    /// Called after a change to the document completed
    fn changed(&self) {}

    /// Persist the document
    fn save(&self) -> ModelResult<()>;
}

#[derive(Debug, Default)]
struct ManagerState {
    connections: usize,
    saves: usize,
    notifications: usize,
    saved: Option<String>,
    refuse_connections: bool,
}

/// Document manager over an in-memory document
#[derive(Debug)]
pub struct InMemoryDocumentManager {
    name: String,
    document: Arc<Mutex<Document>>,
    state: Mutex<ManagerState>,
}

impl InMemoryDocumentManager {
    /// Manage a document called `name` with initial `text`
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        InMemoryDocumentManager {
            name: name.into(),
            document: Arc::new(Mutex::new(Document::new(text))),
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Document name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current content, connected or not
    pub fn text(&self) -> String {
        self.document.lock().text().to_string()
    }

    /// Open connections
    pub fn connection_count(&self) -> usize {
        self.state.lock().connections
    }

    /// Number of saves
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }

    /// Number of `changed` notifications
    pub fn change_notifications(&self) -> usize {
        self.state.lock().notifications
    }

    /// Content at the last save
    pub fn saved_text(&self) -> Option<String> {
        self.state.lock().saved.clone()
    }

    /// Make `connect` fail, as for a document that cannot be opened
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().refuse_connections = refuse;
    }
}

impl DocumentManager for InMemoryDocumentManager {
    fn connect(&self) -> ModelResult<()> {
        let mut state = self.state.lock();
        if state.refuse_connections {
            return Err(ModelError::NotConnected(format!(
                "{} refused the connection",
                self.name
            )));
        }
        state.connections += 1;
        debug!(document = %self.name, connections = state.connections, "Document connected");
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        state.connections = state.connections.saturating_sub(1);
        debug!(document = %self.name, connections = state.connections, "Document disconnected");
    }

    fn document(&self) -> ModelResult<Arc<Mutex<Document>>> {
        if self.state.lock().connections == 0 {
            return Err(ModelError::NotConnected(self.name.clone()));
        }
        Ok(Arc::clone(&self.document))
    }

    fn changed(&self) {
        self.state.lock().notifications += 1;
    }

    fn save(&self) -> ModelResult<()> {
        let text = self.document.lock().text().to_string();
        let mut state = self.state.lock();
        state.saves += 1;
        state.saved = Some(text);
        Ok(())
    }
}
