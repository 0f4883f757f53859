//! Pasting clipboard elements. Clones get fresh ids on every execution so
//! the same clipboard can be pasted repeatedly; after insertion the fixers
//! clean up placeholder debris on both the pasted elements and their new
//! parent.

use super::{restore_element, Command, InsertElementCommand};
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use crate::fixers::SplitReason;
use mathdoc_model::{CursorStateCollection, Document, Element, ElementCursor, ElementId};
use std::any::Any;

#[derive(Debug)]
struct SavedPaste {
    parent: ElementId,
    parent_before: Element,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct PasteElementsCommand {
    elements: Vec<Element>,
    /// Explicit target; `None` binds to the primary cursor on first execute
    target: Option<ElementCursor>,
    resolved_target: Option<ElementCursor>,
    saved: Option<SavedPaste>,
}

impl PasteElementsCommand {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            target: None,
            resolved_target: None,
            saved: None,
        }
    }

    pub fn at_target(mut self, target: ElementCursor) -> Self {
        self.target = Some(target);
        self
    }

    /// Resolve where the clones go: a positional (parent, index) slot
    fn resolve_position(
        &self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
        target: &ElementCursor,
    ) -> EditResult<(ElementId, usize)> {
        match target {
            ElementCursor::Invalid => Err(EditError::InvalidTarget),

            ElementCursor::At(id) => {
                let location = doc
                    .locate(id)
                    .ok_or_else(|| EditError::ElementNotFound(id.clone()))?;
                let is_placeholder =
                    doc.find(id).is_some_and(Element::is_placeholder);
                if is_placeholder {
                    // Drop in at the placeholder's slot; the parent's
                    // post-paste pass strips the placeholder itself
                    Ok((location.parent, location.index))
                } else {
                    Ok((location.parent, location.index + 1))
                }
            }

            ElementCursor::Text { element, offset } => {
                let text_el = doc
                    .find(element)
                    .ok_or_else(|| EditError::ElementNotFound(element.clone()))?;
                let location = doc
                    .locate(element)
                    .ok_or_else(|| EditError::ElementNotFound(element.clone()))?;
                // A text cursor inside a FIXED or GRID slot cannot take
                // siblings; slot content changes only through its placeholder
                let positional = doc.find(&location.parent).is_some_and(|el| {
                    el.placement() == mathdoc_model::ChildPlacement::Positional
                });
                if !positional {
                    return Err(EditError::WrongPlacement);
                }
                let interior = *offset > 0 && *offset < text_el.text_len();
                let splittable = interior
                    && ctx.fixer(text_el.kind()).is_split_allowed(
                        doc,
                        element,
                        SplitReason::Paste,
                        target,
                    );
                if splittable {
                    let right_id = doc.new_id();
                    let right =
                        InsertElementCommand::split_text_run(doc, element, *offset, right_id)?;
                    cursors.notify_text_split(element, *offset, &right);
                    Ok((location.parent, location.index + 1))
                } else if *offset == 0 {
                    Ok((location.parent, location.index))
                } else {
                    Ok((location.parent, location.index + 1))
                }
            }
        }
    }
}

impl Command for PasteElementsCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        if self.elements.is_empty() {
            return Err(EditError::InvalidTarget);
        }
        let target = match &self.resolved_target {
            Some(target) => target.clone(),
            None => {
                let target = self
                    .target
                    .clone()
                    .unwrap_or_else(|| cursors.primary());
                self.resolved_target = Some(target.clone());
                target
            }
        };
        if !target.resolves_in(doc) {
            return Err(EditError::InvalidTarget);
        }

        // Parent snapshot before any mutation, including a possible text
        // split at the target
        let anchor = target.element().ok_or(EditError::InvalidTarget)?;
        let parent_id = match doc.locate(anchor) {
            Some(location) => location.parent,
            None => anchor.clone(), // pasting relative to the root itself
        };
        let parent_before = doc
            .find(&parent_id)
            .cloned()
            .ok_or_else(|| EditError::ElementNotFound(parent_id.clone()))?;
        let cursors_before = cursors.snapshot();

        let (parent, mut index) = self.resolve_position(doc, ctx, cursors, &target)?;
        let positional = doc
            .find(&parent)
            .is_some_and(|el| el.placement() == mathdoc_model::ChildPlacement::Positional);
        if !positional {
            // Fixed and grid slots take exactly one element, by replacing a
            // placeholder cell
            let slot_is_placeholder = doc
                .find(&parent)
                .and_then(|el| el.child(index))
                .is_some_and(Element::is_placeholder);
            if !slot_is_placeholder
                || self.elements.len() != 1
                || !self.elements[0].kind().is_inline_content()
            {
                return Err(EditError::WrongPlacement);
            }
            let mut clone = self.elements[0].clone();
            clone.reassign_ids(doc.ids_mut());
            ctx.fixer(clone.kind()).pre_insert(&mut clone, doc.ids_mut());
            let clone_id = clone.id().to_string();
            let old = doc
                .find_mut(&parent)
                .ok_or_else(|| EditError::ElementNotFound(parent.clone()))?
                .replace_child(index, clone);
            cursors.notify_replaced(&old, &clone_id);
            ctx.fixer(self.elements[0].kind()).post_paste(doc, &clone_id, cursors);
            cursors.set_primary(ElementCursor::At(clone_id));
            self.saved = Some(SavedPaste {
                parent: parent_before.id().to_string(),
                parent_before,
                cursors_before,
            });
            return Ok(());
        }
        tracing::debug!(count = self.elements.len(), "pasting elements");

        let mut inserted_ids = Vec::with_capacity(self.elements.len());
        for prototype in &self.elements {
            let mut clone = prototype.clone();
            clone.reassign_ids(doc.ids_mut());
            ctx.fixer(clone.kind()).pre_insert(&mut clone, doc.ids_mut());
            let clone_id = clone.id().to_string();
            doc.find_mut(&parent)
                .ok_or_else(|| EditError::ElementNotFound(parent.clone()))?
                .insert_child(index, clone);
            inserted_ids.push(clone_id);
            index += 1;
        }

        // Normalize the pasted subtrees, then the parent they landed in
        let parent_kind = *doc
            .find(&parent)
            .ok_or_else(|| EditError::ElementNotFound(parent.clone()))?
            .kind();
        for id in &inserted_ids {
            if let Some(kind) = doc.find(id).map(|el| *el.kind()) {
                ctx.fixer(&kind).post_paste(doc, id, cursors);
            }
        }
        for id in &inserted_ids {
            if let Some(location) = doc.locate(id) {
                ctx.fixer(&parent_kind)
                    .post_paste_child(doc, &parent, location.index, cursors);
            }
        }
        ctx.fixer(&parent_kind).post_paste(doc, &parent, cursors);

        // Cursor lands on the last pasted element that survived cleanup
        if let Some(last) = inserted_ids.iter().rev().find(|id| doc.contains(id)) {
            cursors.set_primary(ElementCursor::At(last.clone()));
        }

        self.saved = Some(SavedPaste {
            parent: parent_before.id().to_string(),
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
            .ok_or_else(|| EditError::UndoDesync("paste was never executed".to_string()))?;

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
        if self.elements.len() == 1 {
            format!("Paste {}", self.elements[0].kind().label())
        } else {
            format!("Paste {} elements", self.elements.len())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
