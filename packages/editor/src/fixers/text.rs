//! Text policy: the only kind that merges by content concatenation and the
//! only kind splittable at an interior offset.

use super::{Fixer, SplitReason};
use mathdoc_model::{CursorStateCollection, Document, ElementCursor};

#[derive(Debug)]
pub struct TextFixer;

impl TextFixer {
    fn both_text(doc: &Document, left: &str, right: &str) -> bool {
        let is_text = |id: &str| {
            doc.find(id)
                .is_some_and(|el| el.kind().is_text_bearing())
        };
        is_text(left) && is_text(right)
    }
}

impl Fixer for TextFixer {
    fn is_merge_allowed(
        &self,
        doc: &Document,
        left: &str,
        right: &str,
        _checking_left: bool,
        check_formats: bool,
    ) -> bool {
        if !Self::both_text(doc, left, right) {
            return false;
        }
        if check_formats {
            match (doc.find(left), doc.find(right)) {
                (Some(a), Some(b)) => a.format() == b.format(),
                _ => false,
            }
        } else {
            true
        }
    }

    /// Append the right run's content to the left run and drop the right
    /// element. The returned cursor sits at the junction.
    fn merge_elements(
        &self,
        doc: &mut Document,
        left: &str,
        right: &str,
        cursors: &mut CursorStateCollection,
    ) -> ElementCursor {
        if !Self::both_text(doc, left, right) {
            return ElementCursor::Invalid;
        }
        let Some(location) = doc.locate(right) else {
            return ElementCursor::Invalid;
        };

        let removed = doc.detach(&location);
        let base = {
            let left_el = doc
                .find_mut(left)
                .expect("merge left operand resolved before detach");
            let base = left_el.text_len();
            left_el
                .text_mut()
                .push_str(removed.text().unwrap_or_default());
            base
        };
        cursors.notify_text_merged(right, left, base);

        ElementCursor::Text {
            element: left.to_string(),
            offset: base,
        }
    }

    fn is_split_allowed(
        &self,
        doc: &Document,
        element: &str,
        _reason: SplitReason,
        cursor: &ElementCursor,
    ) -> bool {
        // Only interior offsets split; boundary offsets degrade to a plain
        // positional insert beside the run
        match cursor {
            ElementCursor::Text {
                element: id,
                offset,
            } if id == element => doc
                .find(element)
                .is_some_and(|el| *offset > 0 && *offset < el.text_len()),
            _ => false,
        }
    }
}
