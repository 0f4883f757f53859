//! Grid policy. Cells are always populated (placeholders mark the empty
//! ones), deleting cell content refills the slot, and rows or columns whose
//! cells are all placeholders get pruned down to a 1x1 minimum.

use super::{make_placeholder, refill_slot, Fixer};
use crate::errors::EditResult;
use mathdoc_model::{
    CursorStateCollection, Document, Element, ElementCursor, GridStore, PlaceholderKind,
};

#[derive(Debug)]
pub struct GridFixer;

impl GridFixer {
    /// Remove fully-empty rows and columns, keeping at least one of each.
    /// Returns the removed cells for cursor retargeting.
    fn prune_store(grid: &mut GridStore) -> Vec<Element> {
        let mut removed = Vec::new();
        while grid.rows() > 1 {
            let empty_row = (0..grid.rows())
                .find(|&row| grid.row_cells(row).all(Element::is_placeholder));
            match empty_row {
                Some(row) => removed.extend(grid.remove_row(row)),
                None => break,
            }
        }
        while grid.columns() > 1 {
            let empty_column = (0..grid.columns())
                .find(|&column| grid.column_cells(column).all(Element::is_placeholder));
            match empty_column {
                Some(column) => removed.extend(grid.remove_column(column)),
                None => break,
            }
        }
        removed
    }

    fn prune(doc: &mut Document, element: &str, cursors: &mut CursorStateCollection) {
        let removed = match doc.find_mut(element) {
            Some(el) => Self::prune_store(el.grid_mut()),
            None => return,
        };
        for cell in &removed {
            cursors.notify_removed(cell, ElementCursor::At(element.to_string()));
        }
    }

    fn placeholder_cells(doc: &mut Document, count: usize) -> Vec<Element> {
        (0..count)
            .map(|_| make_placeholder(doc.ids_mut(), PlaceholderKind::Generic))
            .collect()
    }
}

impl Fixer for GridFixer {
    fn pre_insert(&self, element: &mut Element, ids: &mut mathdoc_model::IdGenerator) {
        if element.grid().is_empty() {
            let cell = make_placeholder(ids, PlaceholderKind::Generic);
            element.set_grid(GridStore::new(1, 1, vec![cell]));
        }
    }

    /// Cell content never leaves a hole: the slot is refilled, then empty
    /// rows and columns collapse
    fn delete_child(
        &self,
        doc: &mut Document,
        parent: &str,
        child: &str,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        refill_slot(doc, parent, child, PlaceholderKind::Generic, cursors)?;
        Self::prune(doc, parent, cursors);
        Ok(())
    }

    /// Grid children only merge within the same row
    fn is_merge_children_allowed(&self, doc: &Document, first: &str, second: &str) -> bool {
        let (Some(a), Some(b)) = (doc.locate(first), doc.locate(second)) else {
            return false;
        };
        if a.parent != b.parent {
            return false;
        }
        match doc.find(&a.parent) {
            Some(grid_el) => {
                let grid = grid_el.grid();
                grid.position_of(a.index).0 == grid.position_of(b.index).0
            }
            None => false,
        }
    }

    fn post_paste(
        &self,
        doc: &mut Document,
        element: &str,
        cursors: &mut CursorStateCollection,
    ) {
        Self::prune(doc, element, cursors);
    }

    fn process_copied_clone(&self, element: &mut Element) {
        Self::prune_store(element.grid_mut());
    }

    fn pre_insert_row(&self, doc: &mut Document, element: &str) -> Vec<Element> {
        let columns = doc
            .find(element)
            .map_or(0, |el| el.grid().columns());
        Self::placeholder_cells(doc, columns)
    }

    fn pre_insert_column(&self, doc: &mut Document, element: &str) -> Vec<Element> {
        let rows = doc.find(element).map_or(0, |el| el.grid().rows());
        Self::placeholder_cells(doc, rows)
    }
}
