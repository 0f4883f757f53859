//! Grid row and column insertion. The grid's fixer supplies the template
//! cells so a custom grid kind can pre-fill new rows; undo restores the
//! whole grid element.

use super::{restore_element, Command};
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use mathdoc_model::{CursorStateCollection, Document, Element, ElementCursor, ElementId};
use std::any::Any;

#[derive(Debug)]
struct SavedGrid {
    element_before: Element,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct InsertGridRowCommand {
    grid: ElementId,
    row: usize,
    saved: Option<SavedGrid>,
}

impl InsertGridRowCommand {
    pub fn new(grid: ElementId, row: usize) -> Self {
        Self {
            grid,
            row,
            saved: None,
        }
    }
}

#[derive(Debug)]
pub struct InsertGridColumnCommand {
    grid: ElementId,
    column: usize,
    saved: Option<SavedGrid>,
}

impl InsertGridColumnCommand {
    pub fn new(grid: ElementId, column: usize) -> Self {
        Self {
            grid,
            column,
            saved: None,
        }
    }
}

fn save_grid(
    doc: &Document,
    cursors: &CursorStateCollection,
    grid: &str,
) -> EditResult<SavedGrid> {
    let element_before = doc
        .find(grid)
        .cloned()
        .ok_or_else(|| EditError::ElementNotFound(grid.to_string()))?;
    if element_before.placement() != mathdoc_model::ChildPlacement::Grid {
        return Err(EditError::WrongPlacement);
    }
    Ok(SavedGrid {
        element_before,
        cursors_before: cursors.snapshot(),
    })
}

fn undo_grid(
    doc: &mut Document,
    cursors: &mut CursorStateCollection,
    grid: &str,
    saved: &mut Option<SavedGrid>,
) -> EditResult<()> {
    let record = saved
        .take()
        .ok_or_else(|| EditError::UndoDesync("grid edit was never executed".to_string()))?;
    match restore_element(doc, grid, record.element_before.clone()) {
        Ok(()) => {
            cursors.restore(record.cursors_before);
            Ok(())
        }
        Err(err) => {
            *saved = Some(record);
            Err(err)
        }
    }
}

impl Command for InsertGridRowCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let saved = save_grid(doc, cursors, &self.grid)?;
        let kind = *saved.element_before.kind();
        if self.row > saved.element_before.grid().rows() {
            return Err(EditError::InvalidTarget);
        }

        let cells = ctx.fixer(&kind).pre_insert_row(doc, &self.grid);
        if cells.len() != saved.element_before.grid().columns() {
            return Err(EditError::WrongPlacement);
        }
        doc.find_mut(&self.grid)
            .ok_or_else(|| EditError::ElementNotFound(self.grid.clone()))?
            .grid_mut()
            .insert_row(self.row, cells);

        self.saved = Some(saved);
        Ok(())
    }

    fn undo(
        &mut self,
        doc: &mut Document,
        _ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        undo_grid(doc, cursors, &self.grid, &mut self.saved)
    }

    fn description(&self) -> String {
        "Insert table row".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Command for InsertGridColumnCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let saved = save_grid(doc, cursors, &self.grid)?;
        let kind = *saved.element_before.kind();
        if self.column > saved.element_before.grid().columns() {
            return Err(EditError::InvalidTarget);
        }

        let cells = ctx.fixer(&kind).pre_insert_column(doc, &self.grid);
        if cells.len() != saved.element_before.grid().rows() {
            return Err(EditError::WrongPlacement);
        }
        doc.find_mut(&self.grid)
            .ok_or_else(|| EditError::ElementNotFound(self.grid.clone()))?
            .grid_mut()
            .insert_column(self.column, cells);

        self.saved = Some(saved);
        Ok(())
    }

    fn undo(
        &mut self,
        doc: &mut Document,
        _ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        undo_grid(doc, cursors, &self.grid, &mut self.saved)
    }

    fn description(&self) -> String {
        "Insert table column".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixers::{Fixer, GridFixer};
    use mathdoc_model::{ElementKind, Format, GridStore, IdGenerator, PlaceholderKind};

    fn placeholder(ids: &mut IdGenerator) -> Element {
        Element::new(
            ids.new_id(),
            ElementKind::Placeholder(PlaceholderKind::Generic),
            Format::default(),
        )
    }

    fn setup_grid() -> (Document, EditContext, CursorStateCollection, String) {
        let mut doc = Document::new("test");
        let ctx = EditContext::with_defaults();
        let paragraph_id = doc.root().child(0).unwrap().id().to_string();
        let mut grid_el = doc.create_element(ElementKind::Grid, Format::default());
        let cells = vec![
            placeholder(doc.ids_mut()),
            placeholder(doc.ids_mut()),
            placeholder(doc.ids_mut()),
            placeholder(doc.ids_mut()),
        ];
        grid_el.set_grid(GridStore::new(2, 2, cells));
        GridFixer.pre_insert(&mut grid_el, doc.ids_mut());
        let grid_id = grid_el.id().to_string();
        doc.find_mut(&paragraph_id).unwrap().append_child(grid_el);
        (doc, ctx, CursorStateCollection::new(), grid_id)
    }

    #[test]
    fn test_insert_row_and_undo() {
        let (mut doc, ctx, mut cursors, grid_id) = setup_grid();
        let before = doc.clone();

        let mut command = InsertGridRowCommand::new(grid_id.clone(), 1);
        command.execute(&mut doc, &ctx, &mut cursors).unwrap();
        {
            let grid = doc.find(&grid_id).unwrap().grid();
            assert_eq!((grid.rows(), grid.columns()), (3, 2));
            assert!(grid.row_cells(1).all(Element::is_placeholder));
        }

        command.undo(&mut doc, &ctx, &mut cursors).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_column_appends_at_edge() {
        let (mut doc, ctx, mut cursors, grid_id) = setup_grid();

        let mut command = InsertGridColumnCommand::new(grid_id.clone(), 2);
        command.execute(&mut doc, &ctx, &mut cursors).unwrap();

        let grid = doc.find(&grid_id).unwrap().grid();
        assert_eq!((grid.rows(), grid.columns()), (2, 3));
    }

    #[test]
    fn test_out_of_range_row_is_rejected() {
        let (mut doc, ctx, mut cursors, grid_id) = setup_grid();
        let before = doc.clone();

        let mut command = InsertGridRowCommand::new(grid_id, 5);
        assert!(matches!(
            command.execute(&mut doc, &ctx, &mut cursors),
            Err(EditError::InvalidTarget)
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_non_grid_target_is_rejected() {
        let (mut doc, ctx, mut cursors, _) = setup_grid();
        let paragraph_id = doc.root().child(0).unwrap().id().to_string();

        let mut command = InsertGridRowCommand::new(paragraph_id, 0);
        assert!(matches!(
            command.execute(&mut doc, &ctx, &mut cursors),
            Err(EditError::WrongPlacement)
        ));
    }
}
