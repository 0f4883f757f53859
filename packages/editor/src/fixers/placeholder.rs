//! Placeholder policy. A placeholder marks required emptiness; the user may
//! delete one (the parent refills or collapses), but internal cleanup must
//! not route a bare delete at one. Cleanup replaces placeholders, it does
//! not delete them.

use super::{DeleteReason, Fixer};
use mathdoc_model::Document;

#[derive(Debug)]
pub struct PlaceholderFixer;

impl Fixer for PlaceholderFixer {
    fn is_delete_allowed(&self, _doc: &Document, _element: &str, reason: DeleteReason) -> bool {
        matches!(
            reason,
            DeleteReason::UserDelete | DeleteReason::SelectionDelete
        )
    }
}
