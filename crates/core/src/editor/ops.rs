//! Structural table operations.
//!
//! Every operation takes the live document and the session state explicitly. It acts on the
//! targeted outer cell and reports what happened through [`EditOutcome`]. When the target no
//! longer exists the state drops back to idle and the call is a no-op.

use super::state::{CellTarget, SessionEditorState};
use super::{EditOutcome, SplitKind};
use crate::builder::region_width;
use crate::constants::{HORIZONTAL_RULE, SPLIT_TABLE_CLASS, TABLE_STYLE, VERTICAL_RULE};
use crate::markup::{
    Attrs, Cell, CellContent, CellKind, Document, Orientation, Region, Row, SplitCell, Table,
};

/// Fewest regions a split produces.
pub const MIN_SPLIT_REGIONS: usize = 2;
/// Most regions a split produces.
pub const MAX_SPLIT_REGIONS: usize = 3;

/// Re-validates the stored target against the live document.
fn live_target(doc: &Document, state: &mut SessionEditorState) -> Option<CellTarget> {
    let target = state.target()?;
    let exists = doc
        .table(target.block)
        .and_then(|t| t.cell(target.row, target.col))
        .is_some();
    if !exists {
        tracing::debug!("editor target {:?} no longer exists; returning to idle", target);
        state.clear();
        return None;
    }
    Some(target)
}

/// Removes the table addressed by `block` and returns to idle.
fn remove_table(doc: &mut Document, state: &mut SessionEditorState, block: usize) -> EditOutcome {
    doc.remove_table(block);
    state.clear();
    EditOutcome::Applied
}

/// Points the target at `(row, col)` of the table at `block`, clamping the column to the row.
fn retarget(table: &Table, state: &mut SessionEditorState, block: usize, row: usize, col: usize) {
    let target = table
        .rows
        .get(row)
        .filter(|r| !r.cells.is_empty())
        .map(|r| CellTarget {
            block,
            row,
            col: col.min(r.cells.len() - 1),
            region: None,
        });
    state.set_target(target);
}

pub fn insert_row_below(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(table) = doc.table_mut(target.block) else {
        return EditOutcome::NoTarget;
    };

    let width = table.rows[target.row].cells.len();
    table
        .rows
        .insert(target.row + 1, Row::blank(width, CellKind::Data));
    EditOutcome::Applied
}

/// Inserts a blank cell right of the target column in every row that has that column.
pub fn insert_column_right(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(table) = doc.table_mut(target.block) else {
        return EditOutcome::NoTarget;
    };

    let mut skipped = 0usize;
    for row in &mut table.rows {
        match row.cells.get(target.col) {
            Some(cell) => {
                let kind = cell.kind;
                row.cells.insert(target.col + 1, Cell::blank(kind));
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!("insert column skipped {} short rows", skipped);
    }
    EditOutcome::Applied
}

pub fn delete_row(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(table) = doc.table_mut(target.block) else {
        return EditOutcome::NoTarget;
    };

    if table.rows.len() <= 1 {
        return remove_table(doc, state, target.block);
    }

    table.rows.remove(target.row);
    let row = target.row.min(table.rows.len() - 1);
    retarget(table, state, target.block, row, target.col);
    EditOutcome::Applied
}

/// Removes the target column from every row that has it.
///
/// A table whose widest row has a single cell is removed entirely, as are rows left empty.
pub fn delete_column(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(table) = doc.table_mut(target.block) else {
        return EditOutcome::NoTarget;
    };

    if table.column_count() <= 1 {
        return remove_table(doc, state, target.block);
    }

    for row in &mut table.rows {
        if target.col < row.cells.len() {
            row.cells.remove(target.col);
        }
    }
    table.rows.retain(|r| !r.cells.is_empty());

    if table.rows.is_empty() {
        return remove_table(doc, state, target.block);
    }

    let row = target.row.min(table.rows.len() - 1);
    retarget(table, state, target.block, row, target.col.saturating_sub(1));
    EditOutcome::Applied
}

pub fn delete_table(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    remove_table(doc, state, target.block)
}

/// Removes a leading header row, or inserts one above the first row.
pub fn toggle_header_row(doc: &mut Document, state: &mut SessionEditorState) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(table) = doc.table_mut(target.block) else {
        return EditOutcome::NoTarget;
    };

    if table.rows[0].is_header_row() {
        if table.rows.len() == 1 {
            return remove_table(doc, state, target.block);
        }
        table.rows.remove(0);
        let row = target.row.saturating_sub(1);
        retarget(table, state, target.block, row, target.col);
    } else {
        let width = table.rows[0].cells.len().max(1);
        table.rows.insert(0, Row::blank(width, CellKind::Header));
        state.set_target(Some(CellTarget {
            row: target.row + 1,
            ..target
        }));
    }
    EditOutcome::Applied
}

/// Subdivides the target cell into `count` regions (clamped to two or three).
///
/// The first region keeps the cell's existing content. A cell already split into two or
/// more regions is left as it is.
pub fn split_cell(
    doc: &mut Document,
    state: &mut SessionEditorState,
    kind: SplitKind,
    count: usize,
) -> EditOutcome {
    let Some(target) = live_target(doc, state) else {
        return EditOutcome::NoTarget;
    };
    let Some(cell) = doc
        .table_mut(target.block)
        .and_then(|t| t.cell_mut(target.row, target.col))
    else {
        return EditOutcome::NoTarget;
    };

    if cell.split().is_some() {
        tracing::debug!("cell {:?} is already split; leaving it unchanged", target);
        return EditOutcome::Unchanged;
    }

    let count = count.clamp(MIN_SPLIT_REGIONS, MAX_SPLIT_REGIONS);
    let existing = match std::mem::replace(&mut cell.content, CellContent::Flow(Vec::new())) {
        CellContent::Flow(nodes) => nodes,
        CellContent::Split(split) => split
            .regions
            .into_iter()
            .next()
            .map(|r| r.content)
            .unwrap_or_default(),
    };

    cell.content = CellContent::Split(new_split(kind, count, existing));
    state.set_target(Some(CellTarget {
        region: Some(0),
        ..target
    }));
    EditOutcome::Applied
}

fn new_split(kind: SplitKind, count: usize, first: Vec<crate::markup::Node>) -> SplitCell {
    let (orientation, rule) = match kind {
        SplitKind::Vertical => (Orientation::Vertical, VERTICAL_RULE),
        SplitKind::Horizontal => (Orientation::Horizontal, HORIZONTAL_RULE),
    };

    let mut first = Some(first);
    let regions = (0..count)
        .map(|idx| {
            let mut style = match orientation {
                Orientation::Vertical => format!("width:{}%;", region_width(count)),
                Orientation::Horizontal => String::new(),
            };
            if idx + 1 < count {
                style.push_str(rule);
            }
            Region {
                attrs: Attrs::new().with("style", style),
                content: first.take().unwrap_or_default(),
            }
        })
        .collect();

    SplitCell {
        attrs: Attrs::new()
            .with("class", SPLIT_TABLE_CLASS)
            .with("style", TABLE_STYLE),
        orientation,
        regions,
    }
}
