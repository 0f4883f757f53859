//! Merging two adjacent siblings into one element. Both elements, and
//! their common parent, must agree; the left element's fixer then carries
//! out the merge and reports where the junction cursor belongs.

use super::{restore_element, Command};
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use mathdoc_model::{CursorStateCollection, Document, Element, ElementCursor, ElementId};
use std::any::Any;

#[derive(Debug)]
struct SavedMerge {
    parent: ElementId,
    parent_before: Element,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct MergeElementsCommand {
    left: ElementId,
    right: ElementId,
    check_formats: bool,
    label: &'static str,
    saved: Option<SavedMerge>,
}

impl MergeElementsCommand {
    pub fn new(left: ElementId, right: ElementId) -> Self {
        Self {
            left,
            right,
            check_formats: true,
            label: "elements",
            saved: None,
        }
    }

    /// Allow merging across differing formats (the left format wins)
    pub fn ignoring_formats(mut self) -> Self {
        self.check_formats = false;
        self
    }
}

impl Command for MergeElementsCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let left_location = doc
            .locate(&self.left)
            .ok_or_else(|| EditError::ElementNotFound(self.left.clone()))?;
        let right_location = doc
            .locate(&self.right)
            .ok_or_else(|| EditError::ElementNotFound(self.right.clone()))?;
        if left_location.parent != right_location.parent
            || right_location.index != left_location.index + 1
        {
            return Err(EditError::Disallowed("merge needs adjacent siblings"));
        }

        let left_kind = *doc
            .find(&self.left)
            .ok_or_else(|| EditError::ElementNotFound(self.left.clone()))?
            .kind();
        let right_kind = *doc
            .find(&self.right)
            .ok_or_else(|| EditError::ElementNotFound(self.right.clone()))?
            .kind();
        let parent_kind = *doc
            .find(&left_location.parent)
            .ok_or_else(|| EditError::ElementNotFound(left_location.parent.clone()))?
            .kind();

        let allowed = ctx.fixer(&left_kind).is_merge_allowed(
            doc,
            &self.left,
            &self.right,
            true,
            self.check_formats,
        ) && ctx.fixer(&right_kind).is_merge_allowed(
            doc,
            &self.left,
            &self.right,
            false,
            self.check_formats,
        ) && ctx
            .fixer(&parent_kind)
            .is_merge_children_allowed(doc, &self.left, &self.right);
        if !allowed {
            return Err(EditError::Disallowed("elements refuse to merge"));
        }

        let parent_before = doc
            .find(&left_location.parent)
            .cloned()
            .ok_or_else(|| EditError::ElementNotFound(left_location.parent.clone()))?;
        let cursors_before = cursors.snapshot();

        tracing::debug!(kind = left_kind.label(), "merging adjacent elements");
        let junction = ctx
            .fixer(&left_kind)
            .merge_elements(doc, &self.left, &self.right, cursors);
        // An invalid junction means the fixer had no retargeting to do
        if junction.is_valid() {
            cursors.set_primary(junction);
        }

        self.label = left_kind.label();
        self.saved = Some(SavedMerge {
            parent: left_location.parent,
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
            .ok_or_else(|| EditError::UndoDesync("merge was never executed".to_string()))?;

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
        format!("Merge {}", self.label)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
