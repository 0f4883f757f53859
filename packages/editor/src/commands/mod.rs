//! # Command Framework
//!
//! Every document mutation is a command: an object that validates, applies,
//! and can exactly reverse one edit. Commands either complete fully or
//! leave the document untouched; the undo stack owns them after execution.
//!
//! `execute` is also the redo path. A command re-executing must reach the
//! same decision it reached the first time; if the document underneath it
//! changed in a way that makes that impossible, it reports
//! [`crate::EditError::UndoDesync`] instead of guessing.

mod delete;
mod format;
mod grid;
mod insert;
mod merge;
mod paste;

pub use delete::DeleteElementCommand;
pub use format::SetFormatCommand;
pub use grid::{InsertGridColumnCommand, InsertGridRowCommand};
pub use insert::{
    FinalCursorPosition, InsertElementCommand, InsertionLocation, InsertionMode,
};
pub use merge::MergeElementsCommand;
pub use paste::PasteElementsCommand;

use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use mathdoc_model::{CursorStateCollection, Document, Element};
use std::any::Any;
use std::fmt;

/// Swap the element with `id` for a previously saved clone. The workhorse
/// of clone-based undo: commands that save an ancestor before mutating
/// restore it wholesale.
pub(crate) fn restore_element(
    doc: &mut Document,
    id: &str,
    replacement: Element,
) -> EditResult<()> {
    if doc.root_id() == id {
        *doc.root_mut() = replacement;
        return Ok(());
    }
    let location = doc
        .locate(id)
        .ok_or_else(|| EditError::UndoDesync(format!("element {id} vanished")))?;
    doc.find_mut(&location.parent)
        .ok_or_else(|| EditError::UndoDesync(format!("parent of {id} vanished")))?
        .replace_child(location.index, replacement);
    Ok(())
}

pub trait Command: fmt::Debug {
    /// Apply the edit. Called once for the initial execution and once per
    /// redo; must be atomic either way.
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()>;

    /// Exactly reverse the last `execute`, including cursor state
    fn undo(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()>;

    /// Absorb a just-executed follow-up command into this one so the pair
    /// undoes as a unit (keystroke coalescing). Returns false to decline.
    fn merge(&mut self, _other: &dyn Command) -> bool {
        false
    }

    /// Human-readable label for undo menus
    fn description(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}
