//! Fixed-arity operator policy. Slots are declared by the kind and are
//! filled with placeholders on attach; deleting slot content swaps the
//! placeholder back in (the inherited delete path does that).

use super::{make_placeholder, Fixer};
use mathdoc_model::{Element, ElementKind, IdGenerator, PlaceholderKind};

#[derive(Debug)]
pub struct OperatorFixer;

impl Fixer for OperatorFixer {
    fn pre_insert(&self, element: &mut Element, ids: &mut IdGenerator) {
        if let ElementKind::Operator { slots } = *element.kind() {
            element.pad_fixed_slots(slots, || {
                make_placeholder(ids, PlaceholderKind::Generic)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EditError;
    use mathdoc_model::{CursorStateCollection, Document, ElementCursor, Format};

    #[test]
    fn test_pre_insert_fills_all_slots() {
        let mut ids = IdGenerator::new("test");
        let mut fraction = Element::new(
            ids.new_id(),
            ElementKind::Operator { slots: 2 },
            Format::default(),
        );

        OperatorFixer.pre_insert(&mut fraction, &mut ids);

        assert_eq!(fraction.child_count(), 2);
        assert!(fraction.children().iter().all(Element::is_placeholder));
    }

    #[test]
    fn test_deleting_slot_content_refills_with_placeholder() {
        let mut doc = Document::new("test");
        let paragraph_id = doc.root().child(0).unwrap().id().to_string();
        let mut fraction = doc.create_element(ElementKind::Operator { slots: 2 }, Format::default());
        OperatorFixer.pre_insert(&mut fraction, doc.ids_mut());
        let mut numerator = doc.create_element(ElementKind::Text, Format::default());
        numerator.set_text("1");
        let numerator_id = numerator.id().to_string();
        fraction.replace_child(0, numerator);
        let fraction_id = fraction.id().to_string();
        doc.find_mut(&paragraph_id).unwrap().append_child(fraction);

        let mut cursors = CursorStateCollection::new();
        let cursor = cursors.add(ElementCursor::Text {
            element: numerator_id.clone(),
            offset: 1,
        });

        OperatorFixer
            .delete_child(&mut doc, &fraction_id, &numerator_id, &mut cursors)
            .unwrap();

        let fraction = doc.find(&fraction_id).unwrap();
        assert_eq!(fraction.child_count(), 2);
        assert!(fraction.child(0).unwrap().is_placeholder());
        assert_eq!(
            cursors.get(cursor),
            &ElementCursor::At(fraction.child(0).unwrap().id().to_string())
        );
    }

    #[test]
    fn test_delete_child_with_unknown_parent_errors() {
        let mut doc = Document::new("test");
        let mut cursors = CursorStateCollection::new();
        let result = OperatorFixer.delete_child(&mut doc, "missing", "child", &mut cursors);
        assert_eq!(
            result,
            Err(EditError::ElementNotFound("missing".to_string()))
        );
    }
}
