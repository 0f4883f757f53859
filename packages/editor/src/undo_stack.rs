//! Bounded undo/redo history of executed commands.
//!
//! The stack owns commands after execution. A new edit clears the redo
//! side; a freshly executed command may instead be absorbed into the one
//! below it when the pair should undo as a unit (keystroke coalescing).
//! A failed undo or redo keeps its entry on the stack so the caller can
//! inspect, retry, or explicitly discard it.

use crate::commands::Command;
use crate::context::EditContext;
use crate::errors::EditResult;
use mathdoc_model::{CursorStateCollection, Document};

pub const DEFAULT_MAX_LEVELS: usize = 100;

#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_levels: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Execute a command and take ownership of it. The document is left
    /// untouched if execution fails.
    pub fn apply(
        &mut self,
        mut command: Box<dyn Command>,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        command.execute(doc, ctx, cursors)?;
        self.redo_stack.clear();

        let absorbed = self
            .undo_stack
            .last_mut()
            .is_some_and(|top| top.merge(command.as_ref()));
        if !absorbed {
            self.undo_stack.push(command);
            if self.undo_stack.len() > self.max_levels {
                self.undo_stack.remove(0);
            }
        }
        Ok(())
    }

    /// Reverse the most recent edit. `Ok(false)` when there is nothing to
    /// undo; on error the entry stays at the top of the stack.
    pub fn undo(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<bool> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match command.undo(doc, ctx, cursors) {
            Ok(()) => {
                self.redo_stack.push(command);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(description = %command.description(), error = %err, "undo failed");
                self.undo_stack.push(command);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone edit
    pub fn redo(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match command.execute(doc, ctx, cursors) {
            Ok(()) => {
                self.undo_stack.push(command);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(description = %command.description(), error = %err, "redo failed");
                self.redo_stack.push(command);
                Err(err)
            }
        }
    }

    /// Drop the top undo entry after a reported failure. Returns whether an
    /// entry was removed.
    pub fn discard_failed(&mut self) -> bool {
        self.undo_stack.pop().is_some()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|command| command.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|command| command.description())
    }

    /// Undo labels, most recent first
    pub fn descriptions(&self) -> Vec<String> {
        self.undo_stack
            .iter()
            .rev()
            .map(|command| command.description())
            .collect()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
