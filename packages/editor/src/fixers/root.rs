//! Root policy: the root is permanent and never left without a paragraph.

use super::{make_placeholder, remove_positional_child, DeleteReason, Fixer};
use crate::errors::{EditError, EditResult};
use mathdoc_model::{
    CursorStateCollection, Document, Element, ElementCursor, ElementKind, Format, PlaceholderKind,
};

#[derive(Debug)]
pub struct RootFixer;

impl Fixer for RootFixer {
    fn is_delete_allowed(&self, _doc: &Document, _element: &str, _reason: DeleteReason) -> bool {
        false
    }

    fn is_delete_child_allowed(
        &self,
        doc: &Document,
        parent: &str,
        _child: &str,
        _reason: DeleteReason,
    ) -> bool {
        // The last top-level element stays; deleting it would leave an
        // unrepresentable empty document
        doc.find(parent).is_some_and(|root| root.child_count() > 1)
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
            .is_some_and(|root| root.child_count() == 1);
        if !emptying {
            remove_positional_child(doc, parent, child, cursors)?;
            return Ok(());
        }

        // Defensive path: `is_delete_child_allowed` vetoes this, but a
        // custom fixer stack may route here anyway. Swap in a fresh empty
        // paragraph so the document keeps its minimal shape.
        let paragraph = empty_paragraph(doc);
        let placeholder_id = paragraph.child(0).map(|p| p.id().to_string());

        let root = doc
            .find_mut(parent)
            .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?;
        let index = root
            .index_of(child)
            .ok_or_else(|| EditError::ElementNotFound(child.to_string()))?;
        let removed = root.remove_child(index);
        root.append_child(paragraph);

        let successor = placeholder_id
            .map(ElementCursor::At)
            .unwrap_or(ElementCursor::Invalid);
        cursors.notify_removed(&removed, successor);
        Ok(())
    }
}

fn empty_paragraph(doc: &mut Document) -> Element {
    let mut paragraph = doc.create_element(ElementKind::Paragraph, Format::default());
    paragraph.append_child(make_placeholder(doc.ids_mut(), PlaceholderKind::Generic));
    paragraph
}
