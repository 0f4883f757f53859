//! List policy. A list always carries a trailing list placeholder, the
//! landing spot for appending the next entry; interior placeholders are
//! paste debris and get stripped.

use super::{ensure_trailing_placeholder, make_placeholder, remove_positional_child};
use super::{DeleteReason, Fixer};
use crate::errors::{EditError, EditResult};
use mathdoc_model::{CursorStateCollection, Document, Element, IdGenerator, PlaceholderKind};

#[derive(Debug)]
pub struct ListFixer;

impl ListFixer {
    fn is_trailing_placeholder(doc: &Document, parent: &str, child: &str) -> bool {
        doc.find(parent).is_some_and(|list| {
            list.children()
                .last()
                .is_some_and(|last| last.id() == child && last.is_placeholder())
        })
    }

    /// Remove placeholders that are not in the trailing position, then make
    /// sure the trailing one exists. Idempotent.
    fn normalize(doc: &mut Document, list: &str, cursors: &mut CursorStateCollection) {
        loop {
            let interior = {
                let Some(el) = doc.find(list) else { return };
                let count = el.child_count();
                el.children()
                    .iter()
                    .take(count.saturating_sub(1))
                    .find(|child| child.is_placeholder())
                    .map(|child| child.id().to_string())
            };
            match interior {
                Some(id) => {
                    if remove_positional_child(doc, list, &id, cursors).is_err() {
                        return;
                    }
                }
                None => break,
            }
        }

        let has_trailing = doc.find(list).map_or(true, |el| {
            el.children().last().is_some_and(Element::is_placeholder)
        });
        if !has_trailing {
            let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::List);
            if let Some(el) = doc.find_mut(list) {
                el.append_child(placeholder);
            }
        }
    }
}

impl Fixer for ListFixer {
    fn pre_insert(&self, element: &mut Element, ids: &mut IdGenerator) {
        ensure_trailing_placeholder(element, ids, PlaceholderKind::List);
    }

    fn is_delete_child_allowed(
        &self,
        doc: &Document,
        parent: &str,
        child: &str,
        reason: DeleteReason,
    ) -> bool {
        // The trailing placeholder is structural, not content
        reason == DeleteReason::StructureCleanup
            || !Self::is_trailing_placeholder(doc, parent, child)
    }

    fn delete_child(
        &self,
        doc: &mut Document,
        parent: &str,
        child: &str,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        if Self::is_trailing_placeholder(doc, parent, child) {
            return Err(EditError::Disallowed(
                "list keeps its trailing placeholder",
            ));
        }
        remove_positional_child(doc, parent, child, cursors)?;
        Self::normalize(doc, parent, cursors);
        Ok(())
    }

    fn post_paste_child(
        &self,
        doc: &mut Document,
        parent: &str,
        _child_index: usize,
        cursors: &mut CursorStateCollection,
    ) {
        Self::normalize(doc, parent, cursors);
    }

    fn post_paste(
        &self,
        doc: &mut Document,
        element: &str,
        cursors: &mut CursorStateCollection,
    ) {
        Self::normalize(doc, element, cursors);
    }
}
