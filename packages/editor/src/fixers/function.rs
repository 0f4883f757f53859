//! Function application policy. A function keeps a trailing function
//! placeholder (the next-argument landing spot) and, when its format asks
//! for a subscripted parameter, a leading subscript slot as well.

use super::{make_placeholder, remove_positional_child, DeleteReason, Fixer};
use crate::errors::{EditError, EditResult};
use mathdoc_model::{
    CursorStateCollection, Document, Element, ElementKind, Format, IdGenerator, PlaceholderKind,
    SUBSCRIPTED_PARAMETER,
};

#[derive(Debug)]
pub struct FunctionFixer;

/// Minimum child count the format demands: the trailing placeholder, plus a
/// subscript slot when the flag is set
pub(crate) fn required_children(format: &Format) -> usize {
    if format.flag_enabled(SUBSCRIPTED_PARAMETER) {
        2
    } else {
        1
    }
}

impl FunctionFixer {
    fn has_trailing_placeholder(element: &Element) -> bool {
        matches!(
            element.children().last().map(Element::kind),
            Some(ElementKind::Placeholder(PlaceholderKind::Function))
        )
    }

    /// Restore the shape invariant on an attached function element
    fn normalize(doc: &mut Document, function: &str, _cursors: &mut CursorStateCollection) {
        let needs_trailing = doc
            .find(function)
            .is_some_and(|el| !Self::has_trailing_placeholder(el));
        if needs_trailing {
            let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::Function);
            if let Some(el) = doc.find_mut(function) {
                el.append_child(placeholder);
            }
        }

        let needs_subscript = doc.find(function).is_some_and(|el| {
            el.child_count() < required_children(el.format())
        });
        if needs_subscript {
            let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::Generic);
            if let Some(el) = doc.find_mut(function) {
                el.insert_child(0, placeholder);
            }
        }
    }
}

impl Fixer for FunctionFixer {
    fn pre_insert(&self, element: &mut Element, ids: &mut IdGenerator) {
        if !Self::has_trailing_placeholder(element) {
            element.append_child(make_placeholder(ids, PlaceholderKind::Function));
        }
        if element.child_count() < required_children(element.format()) {
            element.insert_child(0, make_placeholder(ids, PlaceholderKind::Generic));
        }
    }

    fn is_delete_child_allowed(
        &self,
        doc: &Document,
        parent: &str,
        child: &str,
        reason: DeleteReason,
    ) -> bool {
        if reason == DeleteReason::StructureCleanup {
            return true;
        }
        let Some(function) = doc.find(parent) else {
            return false;
        };
        let is_required_placeholder = function
            .index_of(child)
            .and_then(|index| function.child(index))
            .is_some_and(Element::is_placeholder)
            && function.child_count() <= required_children(function.format());
        !is_required_placeholder
    }

    fn delete_child(
        &self,
        doc: &mut Document,
        parent: &str,
        child: &str,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        if !self.is_delete_child_allowed(doc, parent, child, DeleteReason::UserDelete) {
            return Err(EditError::Disallowed(
                "function keeps its required placeholders",
            ));
        }
        remove_positional_child(doc, parent, child, cursors)?;
        Self::normalize(doc, parent, cursors);
        Ok(())
    }

    /// Flipping the subscripted-parameter flag adds or removes the leading
    /// subscript slot
    fn post_format_change(
        &self,
        doc: &mut Document,
        element: &str,
        old_format: &Format,
        cursors: &mut CursorStateCollection,
    ) {
        let was = old_format.flag_enabled(SUBSCRIPTED_PARAMETER);
        let now = doc
            .find(element)
            .is_some_and(|el| el.format().flag_enabled(SUBSCRIPTED_PARAMETER));
        if was == now {
            return;
        }

        if now {
            let placeholder = make_placeholder(doc.ids_mut(), PlaceholderKind::Generic);
            if let Some(el) = doc.find_mut(element) {
                el.insert_child(0, placeholder);
            }
            return;
        }

        // Flag cleared: a still-empty subscript slot goes away, filled-in
        // content is kept as an ordinary argument
        let empty_subscript = doc
            .find(element)
            .and_then(|el| el.child(0))
            .filter(|first| {
                matches!(
                    first.kind(),
                    ElementKind::Placeholder(PlaceholderKind::Generic)
                )
            })
            .map(|first| first.id().to_string());
        if let Some(id) = empty_subscript {
            let _ = remove_positional_child(doc, element, &id, cursors);
        }
    }
}
