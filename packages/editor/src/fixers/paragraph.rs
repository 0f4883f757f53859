//! Paragraph policy. A paragraph is never childless: when its last real
//! child goes, a generic placeholder stands in, and the placeholder goes
//! away again as soon as real content arrives.

use super::{make_placeholder, remove_positional_child, Fixer, SplitReason};
use crate::errors::{EditError, EditResult};
use mathdoc_model::{
    CursorStateCollection, Document, Element, ElementCursor, IdGenerator, PlaceholderKind,
};

#[derive(Debug)]
pub struct ParagraphFixer;

impl ParagraphFixer {
    /// Drop placeholder children once real content exists. Idempotent; safe
    /// to run after every paste or adoption.
    fn strip_redundant_placeholders(
        doc: &mut Document,
        paragraph: &str,
        cursors: &mut CursorStateCollection,
    ) {
        loop {
            let target = {
                let Some(el) = doc.find(paragraph) else { return };
                if el.child_count() < 2 {
                    return;
                }
                el.children()
                    .iter()
                    .find(|child| child.is_placeholder())
                    .map(|child| child.id().to_string())
            };
            match target {
                Some(id) => {
                    if remove_positional_child(doc, paragraph, &id, cursors).is_err() {
                        return;
                    }
                }
                None => return,
            }
        }
    }
}

impl Fixer for ParagraphFixer {
    fn is_merge_allowed(
        &self,
        doc: &Document,
        left: &str,
        right: &str,
        _checking_left: bool,
        _check_formats: bool,
    ) -> bool {
        let is_paragraph = |id: &str| {
            doc.find(id).is_some_and(|el| {
                matches!(el.kind(), mathdoc_model::ElementKind::Paragraph)
            })
        };
        is_paragraph(left) && is_paragraph(right)
    }

    /// The left paragraph adopts the right paragraph's children; the right
    /// shell disappears. Emptiness placeholders on either side are dropped
    /// when the other side brings real content.
    fn merge_elements(
        &self,
        doc: &mut Document,
        left: &str,
        right: &str,
        cursors: &mut CursorStateCollection,
    ) -> ElementCursor {
        let Some(location) = doc.locate(right) else {
            return ElementCursor::Invalid;
        };
        let mut right_el = doc.detach(&location);
        let right_id = right_el.id().to_string();

        let Some(left_el) = doc.find_mut(left) else {
            return ElementCursor::Invalid;
        };
        let junction = left_el.child_count();
        let mut first_adopted = None;
        while right_el.child_count() > 0 {
            let child = right_el.remove_child(0);
            if first_adopted.is_none() {
                first_adopted = Some(child.id().to_string());
            }
            left_el.append_child(child);
        }

        let result = first_adopted
            .map(ElementCursor::At)
            .unwrap_or_else(|| ElementCursor::At(left.to_string()));
        cursors.notify_shell_removed(&right_id, result.clone());

        Self::strip_redundant_placeholders(doc, left, cursors);

        // The adopted child may have been a placeholder that just got
        // stripped; fall back to whatever now sits at the junction
        if result.resolves_in(doc) {
            return result;
        }
        match doc.find(left) {
            Some(el) if el.child_count() > 0 => {
                let index = junction.min(el.child_count() - 1);
                ElementCursor::At(el.child(index).map(|c| c.id().to_string()).unwrap_or_else(
                    || left.to_string(),
                ))
            }
            _ => ElementCursor::At(left.to_string()),
        }
    }

    fn is_split_allowed(
        &self,
        _doc: &Document,
        _element: &str,
        _reason: SplitReason,
        _cursor: &ElementCursor,
    ) -> bool {
        true
    }

    fn process_split_children(
        &self,
        doc: &mut Document,
        left: &str,
        right: &str,
        _reason: SplitReason,
        _cursors: &mut CursorStateCollection,
    ) {
        // Either half may have ended up childless
        for id in [left, right] {
            let empty = doc.find(id).is_some_and(|el| el.child_count() == 0);
            if empty {
                let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::Generic);
                if let Some(el) = doc.find_mut(id) {
                    el.append_child(placeholder);
                }
            }
        }
    }

    fn pre_insert(&self, element: &mut Element, ids: &mut IdGenerator) {
        if element.child_count() == 0 {
            element.append_child(make_placeholder(ids, PlaceholderKind::Generic));
        }
    }

    fn delete_child(
        &self,
        doc: &mut Document,
        parent: &str,
        child: &str,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let emptying = doc
            .find(parent)
            .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?
            .child_count()
            == 1;
        if !emptying {
            remove_positional_child(doc, parent, child, cursors)?;
            return Ok(());
        }

        // Last child: swap in the emptiness placeholder and park stranded
        // cursors on it
        let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::Generic);
        let placeholder_id = placeholder.id().to_string();
        let paragraph = doc
            .find_mut(parent)
            .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?;
        let index = paragraph
            .index_of(child)
            .ok_or_else(|| EditError::ElementNotFound(child.to_string()))?;
        let removed = paragraph.remove_child(index);
        paragraph.append_child(placeholder);
        cursors.notify_removed(&removed, ElementCursor::At(placeholder_id));
        Ok(())
    }

    fn post_paste_child(
        &self,
        doc: &mut Document,
        parent: &str,
        _child_index: usize,
        cursors: &mut CursorStateCollection,
    ) {
        Self::strip_redundant_placeholders(doc, parent, cursors);
    }

    fn post_paste(
        &self,
        doc: &mut Document,
        element: &str,
        cursors: &mut CursorStateCollection,
    ) {
        Self::strip_redundant_placeholders(doc, element, cursors);
    }
}
