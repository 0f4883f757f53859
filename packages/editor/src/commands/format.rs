//! Format changes. Mostly a value swap, but kinds whose required children
//! depend on the format (functions and their subscript slot) react through
//! `post_format_change`, so undo restores the whole element.

use super::{restore_element, Command};
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use mathdoc_model::{CursorStateCollection, Document, Element, ElementCursor, ElementId, Format};
use std::any::Any;

#[derive(Debug)]
struct SavedFormat {
    element_before: Element,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct SetFormatCommand {
    target: ElementId,
    format: Format,
    label: &'static str,
    saved: Option<SavedFormat>,
}

impl SetFormatCommand {
    pub fn new(target: ElementId, format: Format) -> Self {
        Self {
            target,
            format,
            label: "element",
            saved: None,
        }
    }
}

impl Command for SetFormatCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let element_before = doc
            .find(&self.target)
            .cloned()
            .ok_or_else(|| EditError::ElementNotFound(self.target.clone()))?;
        let kind = *element_before.kind();
        let old_format = element_before.format().clone();
        let cursors_before = cursors.snapshot();

        doc.find_mut(&self.target)
            .ok_or_else(|| EditError::ElementNotFound(self.target.clone()))?
            .set_format(self.format.clone());
        ctx.fixer(&kind)
            .post_format_change(doc, &self.target, &old_format, cursors);

        self.label = kind.label();
        self.saved = Some(SavedFormat {
            element_before,
            cursors_before,
        });
        Ok(())
    }

    fn undo(
        &mut self,
        doc: &mut Document,
        _ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let saved = self
            .saved
            .take()
            .ok_or_else(|| EditError::UndoDesync("format was never changed".to_string()))?;

        match restore_element(doc, &self.target, saved.element_before.clone()) {
            Ok(()) => {
                cursors.restore(saved.cursors_before);
                Ok(())
            }
            Err(err) => {
                self.saved = Some(saved);
                Err(err)
            }
        }
    }

    fn description(&self) -> String {
        format!("Format {}", self.label)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
