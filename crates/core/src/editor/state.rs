//! Per-session editor state: which cell is targeted and what text is selected.
//!
//! The state is owned by one [`super::EditorSurface`] and handed explicitly to the operations
//! in [`super::ops`]. Nothing here is shared between sessions.

use crate::markup::{CellContent, Document, Highlight};

/// A position reported by the editing canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfacePoint {
    /// Inside cell `(row, col)` of the table at top-level `block`. The block is either the
    /// table itself or a wrapper element around it.
    ///
    /// `inner` is the region index when the point lies inside a split cell. It never changes
    /// which cell is targeted, only which region is highlighted.
    Cell {
        block: usize,
        row: usize,
        col: usize,
        inner: Option<usize>,
    },
    /// Inside the top-level block at `block`, outside any table. A block index one past the
    /// end addresses the end of the document.
    Block { block: usize },
}

impl SurfacePoint {
    pub fn cell(block: usize, row: usize, col: usize) -> Self {
        SurfacePoint::Cell {
            block,
            row,
            col,
            inner: None,
        }
    }

    pub fn region(block: usize, row: usize, col: usize, region: usize) -> Self {
        SurfacePoint::Cell {
            block,
            row,
            col,
            inner: Some(region),
        }
    }
}

/// The outer cell structural operations act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellTarget {
    pub block: usize,
    pub row: usize,
    pub col: usize,
    /// Highlighted region when the cell is split.
    pub region: Option<usize>,
}

/// A captured character range. Offsets count characters of text content under `anchor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: SurfacePoint,
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionEditorState {
    target: Option<CellTarget>,
    selection: Option<TextSelection>,
}

impl SessionEditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<CellTarget> {
        self.target
    }

    /// True while a cell is targeted; false when idle.
    pub fn is_targeted(&self) -> bool {
        self.target.is_some()
    }

    pub fn selection(&self) -> Option<&TextSelection> {
        self.selection.as_ref()
    }

    pub(crate) fn set_target(&mut self, target: Option<CellTarget>) {
        self.target = target;
    }

    pub(crate) fn set_selection(&mut self, selection: Option<TextSelection>) {
        self.selection = selection;
    }

    /// Drops the target and any selection, returning to idle.
    pub fn clear(&mut self) {
        self.target = None;
        self.selection = None;
    }

    /// Highlight to apply in previews for the current target.
    pub fn highlight(&self) -> Option<Highlight> {
        self.target.map(|t| Highlight {
            block: t.block,
            row: t.row,
            col: t.col,
            region: t.region,
        })
    }
}

/// Resolves a canvas point to the outer cell it lies in.
///
/// Returns `None` for points outside any addressable table cell. A region index is kept only
/// when the cell actually has that region.
pub fn resolve_point(doc: &Document, point: &SurfacePoint) -> Option<CellTarget> {
    let SurfacePoint::Cell {
        block,
        row,
        col,
        inner,
    } = *point
    else {
        return None;
    };

    let cell = doc.table(block)?.cell(row, col)?;
    let region = match &cell.content {
        CellContent::Split(split) => inner.filter(|r| *r < split.regions.len()),
        CellContent::Flow(_) => None,
    };

    Some(CellTarget {
        block,
        row,
        col,
        region,
    })
}
