//! Element deletion. Both the element's own fixer and its parent's get a
//! veto; the parent's fixer then performs the removal so placement-specific
//! repair (slot refill, placeholder regrowth, grid pruning) happens in one
//! place.

use super::{restore_element, Command};
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use crate::fixers::DeleteReason;
use mathdoc_model::{CursorStateCollection, Document, Element, ElementCursor, ElementId};
use std::any::Any;

#[derive(Debug)]
struct SavedDelete {
    parent: ElementId,
    parent_before: Element,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct DeleteElementCommand {
    target: ElementId,
    reason: DeleteReason,
    label: &'static str,
    saved: Option<SavedDelete>,
}

impl DeleteElementCommand {
    pub fn new(target: ElementId, reason: DeleteReason) -> Self {
        Self {
            target,
            reason,
            label: "element",
            saved: None,
        }
    }
}

impl Command for DeleteElementCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let target_kind = *doc
            .find(&self.target)
            .ok_or_else(|| EditError::ElementNotFound(self.target.clone()))?
            .kind();
        let location = doc
            .locate(&self.target)
            .ok_or(EditError::InvalidTarget)?;
        let parent_kind = *doc
            .find(&location.parent)
            .ok_or_else(|| EditError::ElementNotFound(location.parent.clone()))?
            .kind();

        if !ctx
            .fixer(&target_kind)
            .is_delete_allowed(doc, &self.target, self.reason)
        {
            return Err(EditError::Disallowed("element refuses deletion"));
        }
        if !ctx.fixer(&parent_kind).is_delete_child_allowed(
            doc,
            &location.parent,
            &self.target,
            self.reason,
        ) {
            return Err(EditError::Disallowed("parent refuses child deletion"));
        }

        let parent_before = doc
            .find(&location.parent)
            .cloned()
            .ok_or_else(|| EditError::ElementNotFound(location.parent.clone()))?;
        let cursors_before = cursors.snapshot();

        tracing::debug!(kind = target_kind.label(), reason = ?self.reason, "deleting element");
        ctx.fixer(&parent_kind)
            .delete_child(doc, &location.parent, &self.target, cursors)?;

        self.label = target_kind.label();
        self.saved = Some(SavedDelete {
            parent: location.parent,
            parent_before,
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
            .ok_or_else(|| EditError::UndoDesync("delete was never executed".to_string()))?;

        match restore_element(doc, &saved.parent, saved.parent_before.clone()) {
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
        format!("Delete {}", self.label)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
