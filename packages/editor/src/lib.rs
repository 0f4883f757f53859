//! # Mathdoc Editor
//!
//! Mutation engine for mathdoc documents: kind-specific structural policy
//! (fixers), atomic undoable commands, a bounded undo stack, and the edit
//! session facade that ties them to a document and its cursors.
//!
//! The layering is strict. The model crate stores the tree and repairs
//! cursors when told what changed; this crate decides what edits mean:
//! which are legal, what cleanup they imply, and how they reverse.
//!
//! ```
//! use mathdoc_editor::{
//!     EditSession, FinalCursorPosition, InsertElementCommand, InsertionLocation,
//! };
//! use mathdoc_model::{ElementKind, Format};
//!
//! let mut session = EditSession::new("notes");
//! let mut run = session.create_element(ElementKind::Text, Format::default());
//! run.set_text("hello");
//! session.execute(Box::new(InsertElementCommand::new(
//!     run,
//!     InsertionLocation::AtCursor,
//!     FinalCursorPosition::ElementEndOfText,
//! )))?;
//! assert!(session.can_undo());
//! # Ok::<(), mathdoc_editor::EditError>(())
//! ```

pub mod commands;
pub mod context;
pub mod errors;
pub mod fixers;
pub mod session;
pub mod undo_stack;

pub use commands::{
    Command, DeleteElementCommand, FinalCursorPosition, InsertElementCommand,
    InsertGridColumnCommand, InsertGridRowCommand, InsertionLocation, InsertionMode,
    MergeElementsCommand, PasteElementsCommand, SetFormatCommand,
};
pub use context::{EditContext, ElementFactory};
pub use errors::{EditError, EditResult};
pub use fixers::{DeleteReason, Fixer, FixerRegistry, SplitReason};
pub use session::{ChangeEvent, EditSession};
pub use undo_stack::UndoStack;
