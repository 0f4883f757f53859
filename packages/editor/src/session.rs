//! # Edit Session
//!
//! The facade an embedder talks to: one document, its cursors, the fixer
//! context, and the undo history, behind a small API that keeps them
//! consistent. Listeners get a change event after every observable
//! transition, including failures.

use crate::commands::Command;
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use crate::undo_stack::UndoStack;
use mathdoc_model::{
    CursorId, CursorStateCollection, Document, Element, ElementCursor, ElementId,
};

/// What a session listener is told about
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The tree changed; `version` increments monotonically per change
    TreeChanged { version: u64 },
    CursorMoved,
    CommandFailed {
        description: String,
        error: EditError,
    },
    UndoFailed {
        description: String,
        error: EditError,
    },
}

type Listener = Box<dyn Fn(&ChangeEvent)>;

pub struct EditSession {
    document: Document,
    context: EditContext,
    cursors: CursorStateCollection,
    primary: CursorId,
    undo_stack: UndoStack,
    version: u64,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("document", &self.document)
            .field("cursors", &self.cursors)
            .field("version", &self.version)
            .field("undo_levels", &self.undo_stack.undo_levels())
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Open a session on a fresh document. The primary cursor starts on the
    /// first paragraph's content placeholder.
    pub fn new(name: &str) -> Self {
        let document = Document::new(name);
        let mut cursors = CursorStateCollection::new();
        let initial = document
            .root()
            .child(0)
            .and_then(|paragraph| paragraph.child(0))
            .map(|placeholder| ElementCursor::At(placeholder.id().to_string()))
            .unwrap_or(ElementCursor::Invalid);
        let primary = cursors.add(initial);
        Self {
            document,
            context: EditContext::with_defaults(),
            cursors,
            primary,
            undo_stack: UndoStack::new(),
            version: 0,
            listeners: Vec::new(),
        }
    }

    /// Open a session over an existing document and context
    pub fn with_document(document: Document, context: EditContext) -> Self {
        let mut cursors = CursorStateCollection::new();
        let primary = cursors.add(ElementCursor::Invalid);
        Self {
            document,
            context,
            cursors,
            primary,
            undo_stack: UndoStack::new(),
            version: 0,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: ChangeEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Run a command through the undo stack. The document is untouched when
    /// this returns an error.
    pub fn execute(&mut self, command: Box<dyn Command>) -> EditResult<()> {
        // The stack takes ownership; keep the label for failure reporting
        let description = command.description();
        match self.undo_stack.apply(
            command,
            &mut self.document,
            &self.context,
            &mut self.cursors,
        ) {
            Ok(()) => {
                self.version += 1;
                debug_assert!(self.cursors.all_resolve_in(&self.document));
                self.emit(ChangeEvent::TreeChanged {
                    version: self.version,
                });
                Ok(())
            }
            Err(error) => {
                tracing::debug!(%description, %error, "command rejected");
                self.emit(ChangeEvent::CommandFailed {
                    description,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn undo(&mut self) -> EditResult<bool> {
        let description = self.undo_stack.undo_description().unwrap_or_default();
        match self
            .undo_stack
            .undo(&mut self.document, &self.context, &mut self.cursors)
        {
            Ok(false) => Ok(false),
            Ok(true) => {
                self.version += 1;
                self.emit(ChangeEvent::TreeChanged {
                    version: self.version,
                });
                Ok(true)
            }
            Err(error) => {
                self.emit(ChangeEvent::UndoFailed {
                    description,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn redo(&mut self) -> EditResult<bool> {
        let description = self.undo_stack.redo_description().unwrap_or_default();
        match self
            .undo_stack
            .redo(&mut self.document, &self.context, &mut self.cursors)
        {
            Ok(false) => Ok(false),
            Ok(true) => {
                self.version += 1;
                self.emit(ChangeEvent::TreeChanged {
                    version: self.version,
                });
                Ok(true)
            }
            Err(error) => {
                self.emit(ChangeEvent::UndoFailed {
                    description,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Move the primary cursor; the target must resolve in the current tree
    pub fn set_cursor(&mut self, cursor: ElementCursor) -> EditResult<()> {
        if cursor.is_valid() && !cursor.resolves_in(&self.document) {
            return Err(EditError::InvalidTarget);
        }
        self.cursors.set(self.primary, cursor);
        self.emit(ChangeEvent::CursorMoved);
        Ok(())
    }

    /// Register an additional cursor (selection endpoint); it is repaired
    /// across edits like the primary one
    pub fn add_cursor(&mut self, cursor: ElementCursor) -> EditResult<CursorId> {
        if cursor.is_valid() && !cursor.resolves_in(&self.document) {
            return Err(EditError::InvalidTarget);
        }
        Ok(self.cursors.add(cursor))
    }

    /// Build a detached element through the session's factory
    pub fn create_element(
        &mut self,
        kind: mathdoc_model::ElementKind,
        format: mathdoc_model::Format,
    ) -> Element {
        self.context.create(&mut self.document, kind, format)
    }

    /// Clipboard copy: a deep clone with fresh ids, post-processed by its
    /// fixer (grids shed fully-empty rows, for example)
    pub fn copy_element(&mut self, id: &ElementId) -> EditResult<Element> {
        let mut clone = self
            .document
            .find(id)
            .cloned()
            .ok_or_else(|| EditError::ElementNotFound(id.clone()))?;
        clone.reassign_ids(self.document.ids_mut());
        self.context.fixer(clone.kind()).process_copied_clone(&mut clone);
        Ok(clone)
    }

    // ---- accessors ----

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn context(&self) -> &EditContext {
        &self.context
    }

    pub fn cursors(&self) -> &CursorStateCollection {
        &self.cursors
    }

    pub fn cursor(&self) -> ElementCursor {
        self.cursors.get(self.primary).clone()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.undo_stack.redo_description()
    }

    pub fn undo_stack(&mut self) -> &mut UndoStack {
        &mut self.undo_stack
    }
}
