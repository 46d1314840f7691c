//! # Table Editor Surface
//!
//! An editing session over one template document. The surface owns the live [`Document`] and
//! the session's [`SessionEditorState`], routes canvas input to the structural operations in
//! [`ops`] and the text operations in [`format`], and serialises on demand.
//!
//! ## States
//!
//! - **Idle**: no cell targeted. Structural operations return [`EditOutcome::NoTarget`].
//! - **Cell targeted**: entered by [`EditorSurface::focus`] on a point inside a table cell,
//!   whether the table sits at the top level or inside a wrapper element. Points inside a
//!   split region still target the outer cell.
//!
//! [`EditorSurface::blur`] always returns to idle.
//!
//! ## Table-only mode
//!
//! Lab-value entry forms may only contain a table. In [`EditMode::TableOnly`], input outside
//! existing table cells is rejected and the document is rolled back to the last valid state. Pastes
//! are reduced to plain text, and on blur the document is cut down to its first table.

pub mod format;
pub mod ops;
pub mod state;

pub use state::{resolve_point, CellTarget, SessionEditorState, SurfacePoint, TextSelection};

use crate::config::FontSizeBounds;
use crate::markup::{
    emit_document, parse_fragment, strip_marker_comments, text_content, Document, EmitOptions,
    Node,
};

/// Outcome of one editor operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The document changed.
    Applied,
    /// The operation was valid but had nothing to do (already split, empty input, size out
    /// of bounds).
    Unchanged,
    /// No cell is targeted, or the addressed position does not exist.
    NoTarget,
    /// Input outside the allowed area in table-only mode. The surface has been resynced.
    Rejected,
}

impl EditOutcome {
    pub fn is_applied(self) -> bool {
        self == EditOutcome::Applied
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Free-form rich text with tables.
    #[default]
    Free,
    /// Only a single table is allowed.
    TableOnly,
}

/// Direction of a cell split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitKind {
    /// Side by side regions.
    Vertical,
    /// Stacked regions.
    Horizontal,
}

#[derive(Clone, Debug)]
pub struct EditorSurface {
    document: Document,
    state: SessionEditorState,
    mode: EditMode,
    font_sizes: FontSizeBounds,
    /// Last document that satisfied table-only mode.
    last_valid: Document,
}

impl EditorSurface {
    /// Opens `markup` for editing.
    pub fn open(markup: &str, mode: EditMode) -> Self {
        Self::from_document(Document::parse(markup), mode)
    }

    pub fn from_document(document: Document, mode: EditMode) -> Self {
        let document = match mode {
            EditMode::TableOnly => reduce_document(&document).unwrap_or(document),
            EditMode::Free => document,
        };
        Self {
            last_valid: document.clone(),
            document,
            state: SessionEditorState::new(),
            mode,
            font_sizes: FontSizeBounds::default(),
        }
    }

    pub fn with_font_sizes(mut self, font_sizes: FontSizeBounds) -> Self {
        self.font_sizes = font_sizes;
        self
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn state(&self) -> &SessionEditorState {
        &self.state
    }

    pub fn target(&self) -> Option<CellTarget> {
        self.state.target()
    }

    /// Targets the outer cell under `point`. Returns false (and goes idle) if there is none.
    pub fn focus(&mut self, point: SurfacePoint) -> bool {
        let target = resolve_point(&self.document, &point);
        if target.is_none() {
            tracing::debug!("focus at {:?} is outside any table cell", point);
        }
        self.state.set_target(target);
        target.is_some()
    }

    /// Ends interaction: clears target and selection, and enforces table-only mode.
    pub fn blur(&mut self) {
        self.state.clear();
        if self.mode != EditMode::TableOnly {
            return;
        }
        match reduce_document(&self.document) {
            Some(reduced) => {
                self.document = reduced;
                self.last_valid = self.document.clone();
            }
            None => {
                tracing::debug!("table-only document lost its table; restoring last valid state");
                self.document = self.last_valid.clone();
            }
        }
    }

    pub fn insert_row_below(&mut self) -> EditOutcome {
        let outcome = ops::insert_row_below(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    pub fn insert_column_right(&mut self) -> EditOutcome {
        let outcome = ops::insert_column_right(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    pub fn delete_row(&mut self) -> EditOutcome {
        let outcome = ops::delete_row(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    pub fn delete_column(&mut self) -> EditOutcome {
        let outcome = ops::delete_column(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    pub fn delete_table(&mut self) -> EditOutcome {
        let outcome = ops::delete_table(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    pub fn toggle_header_row(&mut self) -> EditOutcome {
        let outcome = ops::toggle_header_row(&mut self.document, &mut self.state);
        self.after_structural(outcome)
    }

    /// Splits the targeted cell in two.
    pub fn split_cell(&mut self, kind: SplitKind) -> EditOutcome {
        self.split_cell_into(kind, ops::MIN_SPLIT_REGIONS)
    }

    /// Splits the targeted cell into `count` regions, clamped to two or three.
    pub fn split_cell_into(&mut self, kind: SplitKind, count: usize) -> EditOutcome {
        let outcome = ops::split_cell(&mut self.document, &mut self.state, kind, count);
        self.after_structural(outcome)
    }

    pub fn insert_text(&mut self, point: SurfacePoint, text: &str) -> EditOutcome {
        if let Some(rejected) = self.guard_table_only(&point) {
            return rejected;
        }
        let outcome = format::insert_text(&mut self.document, &point, text);
        self.after_content(outcome)
    }

    /// Pastes a markup fragment. In table-only mode only its text is kept.
    ///
    /// Marker blocks in the fragment are dropped; the document keeps its own.
    pub fn paste(&mut self, point: SurfacePoint, fragment: &str) -> EditOutcome {
        if let Some(rejected) = self.guard_table_only(&point) {
            return rejected;
        }
        let mut nodes = parse_fragment(fragment);
        strip_marker_comments(&mut nodes);
        let outcome = match self.mode {
            EditMode::TableOnly => {
                format::insert_text(&mut self.document, &point, &text_content(&nodes))
            }
            EditMode::Free => format::append_nodes(&mut self.document, &point, nodes),
        };
        self.after_content(outcome)
    }

    /// Captures a text range for later formatting. The end is clamped to the available text.
    pub fn select(&mut self, selection: TextSelection) -> EditOutcome {
        if let Some(rejected) = self.guard_table_only(&selection.anchor) {
            return rejected;
        }
        let Some(len) = format::selectable_len(&mut self.document, &selection.anchor) else {
            self.state.set_selection(None);
            return EditOutcome::NoTarget;
        };
        let end = selection.end.min(len);
        let start = selection.start.min(end);
        self.state.set_selection(Some(TextSelection {
            anchor: selection.anchor,
            start,
            end,
        }));
        EditOutcome::Applied
    }

    /// Applies a font-size run to the captured selection.
    pub fn apply_font_size(&mut self, px: u16) -> EditOutcome {
        let Some(selection) = self.state.selection().copied() else {
            return EditOutcome::NoTarget;
        };
        if !self.font_sizes.contains(px) {
            tracing::debug!(
                "font size {}px outside {}..={}; ignored",
                px,
                self.font_sizes.min(),
                self.font_sizes.max()
            );
            return EditOutcome::Unchanged;
        }
        let outcome = format::apply_font_size(&mut self.document, &selection, px);
        self.after_content(outcome)
    }

    /// Persistable markup, re-derived from the live document on every call.
    pub fn markup(&self) -> String {
        self.document.to_markup()
    }

    /// Markup with the targeted cell (or region) highlighted, for display only.
    pub fn preview_markup(&self) -> String {
        emit_document(
            &self.document,
            &EmitOptions {
                highlight: self.state.highlight(),
            },
        )
    }

    /// In table-only mode, anything but an existing cell is outside the allowed area.
    fn guard_table_only(&mut self, point: &SurfacePoint) -> Option<EditOutcome> {
        if self.mode != EditMode::TableOnly || resolve_point(&self.document, point).is_some() {
            return None;
        }
        tracing::debug!("input at {:?} rejected in table-only mode; resyncing", point);
        self.document = self.last_valid.clone();
        self.state.clear();
        Some(EditOutcome::Rejected)
    }

    fn after_structural(&mut self, outcome: EditOutcome) -> EditOutcome {
        if outcome.is_applied() {
            // Offsets captured before a structural change no longer line up.
            self.state.set_selection(None);
            self.record_valid();
        }
        outcome
    }

    fn after_content(&mut self, outcome: EditOutcome) -> EditOutcome {
        if outcome.is_applied() {
            self.record_valid();
        }
        outcome
    }

    fn record_valid(&mut self) {
        if self.mode == EditMode::TableOnly && self.document.first_table().is_some() {
            self.last_valid = self.document.clone();
        }
    }
}

/// Reduces a document to only its first table (depth-first), dropping the marker.
fn reduce_document(doc: &Document) -> Option<Document> {
    let table = doc.first_table()?.clone();
    Some(Document {
        marker: None,
        body: vec![Node::Table(table)],
    })
}

/// Markup of the first table in `markup`, or `None` if it has no table.
pub fn reduce_to_first_table(markup: &str) -> Option<String> {
    reduce_document(&Document::parse(markup)).map(|d| d.to_markup())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_document;
    use crate::codec::{self, FieldDefinition, TemplateDefinition};

    fn template() -> String {
        build_document(&TemplateDefinition::new(vec![
            FieldDefinition::new("Findings", 1),
            FieldDefinition::new("Impression", 2),
        ]))
    }

    #[test]
    fn test_focus_and_blur_drive_state() {
        let mut surface = EditorSurface::open(&template(), EditMode::Free);
        assert_eq!(surface.insert_row_below(), EditOutcome::NoTarget);

        assert!(surface.focus(SurfacePoint::region(0, 1, 1, 1)));
        let target = surface.target().unwrap();
        assert_eq!((target.row, target.col, target.region), (1, 1, Some(1)));

        assert!(!surface.focus(SurfacePoint::Block { block: 3 }));
        assert!(surface.target().is_none());

        surface.focus(SurfacePoint::cell(0, 0, 0));
        surface.blur();
        assert!(!surface.state().is_targeted());
    }

    #[test]
    fn test_markup_keeps_marker_and_reflects_mutations() {
        let mut surface = EditorSurface::open(&template(), EditMode::Free);
        surface.focus(SurfacePoint::cell(0, 0, 0));
        assert_eq!(surface.insert_row_below(), EditOutcome::Applied);
        let markup = surface.markup();
        assert!(codec::decode(&markup).is_some());
        assert_eq!(Document::parse(&markup).table(0).unwrap().rows.len(), 3);
    }

    #[test]
    fn test_preview_highlights_target_and_markup_does_not() {
        let mut surface = EditorSurface::open(&template(), EditMode::Free);
        surface.focus(SurfacePoint::cell(0, 0, 0));
        assert_eq!(surface.preview_markup().matches("data-active=\"true\"").count(), 1);
        assert!(!surface.markup().contains("data-active"));

        surface.focus(SurfacePoint::region(0, 1, 1, 0));
        let preview = surface.preview_markup();
        assert_eq!(preview.matches("data-active=\"true\"").count(), 1);

        surface.blur();
        assert!(!surface.preview_markup().contains("data-active"));
    }

    #[test]
    fn test_split_twice_through_surface_keeps_two_regions() {
        let mut surface = EditorSurface::open("<table><tr><td>a</td></tr></table>", EditMode::Free);
        surface.focus(SurfacePoint::cell(0, 0, 0));
        assert_eq!(surface.split_cell(SplitKind::Vertical), EditOutcome::Applied);
        assert_eq!(surface.split_cell(SplitKind::Vertical), EditOutcome::Unchanged);
        let doc = Document::parse(&surface.markup());
        assert_eq!(doc.table(0).unwrap().rows[0].cells[0].split().unwrap().regions.len(), 2);
    }

    #[test]
    fn test_font_size_respects_bounds_and_selection() {
        let mut surface = EditorSurface::open("<p>hello</p>", EditMode::Free)
            .with_font_sizes(FontSizeBounds::new(10, 20).unwrap());
        assert_eq!(surface.apply_font_size(12), EditOutcome::NoTarget);

        surface.select(TextSelection {
            anchor: SurfacePoint::Block { block: 0 },
            start: 0,
            end: 99,
        });
        assert_eq!(surface.state().selection().map(|s| s.end), Some(5));
        assert_eq!(surface.apply_font_size(30), EditOutcome::Unchanged);
        assert_eq!(surface.apply_font_size(12), EditOutcome::Applied);
        assert_eq!(
            surface.markup(),
            "<p><span style=\"font-size:12px\">hello</span></p>"
        );
    }

    #[test]
    fn test_table_only_rejects_input_outside_cells() {
        let mut surface = EditorSurface::open(
            "<p>intro</p><table><tr><td>1</td></tr></table>",
            EditMode::TableOnly,
        );
        assert_eq!(surface.document().body.len(), 1);
        assert_eq!(
            surface.insert_text(SurfacePoint::Block { block: 1 }, "stray"),
            EditOutcome::Rejected
        );
        assert!(!surface.markup().contains("stray"));
        assert_eq!(
            surface.insert_text(SurfacePoint::cell(0, 0, 0), "0"),
            EditOutcome::Applied
        );
        assert!(surface.markup().contains("<td>10</td>"));
    }

    #[test]
    fn test_table_only_paste_is_plain_text() {
        let mut surface = EditorSurface::open("<table><tr><td></td></tr></table>", EditMode::TableOnly);
        surface.paste(SurfacePoint::cell(0, 0, 0), "<b>5.4</b> <i>mmol/L</i>");
        assert!(surface.markup().contains("<td>5.4 mmol/L</td>"));
    }

    #[test]
    fn test_table_only_blur_restores_last_table() {
        let mut surface = EditorSurface::open("<table><tr><td>1</td></tr></table>", EditMode::TableOnly);
        surface.focus(SurfacePoint::cell(0, 0, 0));
        surface.insert_text(SurfacePoint::cell(0, 0, 0), "2");
        assert_eq!(surface.delete_table(), EditOutcome::Applied);
        assert!(surface.document().body.is_empty());
        surface.blur();
        assert_eq!(surface.markup(), "<table><tbody><tr><td>12</td></tr></tbody></table>");
    }

    #[test]
    fn test_reduce_to_first_table_finds_nested_table_and_drops_marker() {
        let markup = format!(
            "{}<div><p>x</p><table><tr><td>a</td></tr></table></div><table><tr><td>b</td></tr></table>",
            codec::encode(&TemplateDefinition::default())
        );
        assert_eq!(
            reduce_to_first_table(&markup).as_deref(),
            Some("<table><tbody><tr><td>a</td></tr></tbody></table>")
        );
        assert_eq!(reduce_to_first_table("<p>no tables</p>"), None);
    }

    #[test]
    fn test_structural_edits_reach_table_inside_wrapper() {
        let mut surface = EditorSurface::open(
            "<div><table><tr><td>a</td><td>b</td></tr></table></div>",
            EditMode::Free,
        );
        assert!(surface.focus(SurfacePoint::cell(0, 0, 0)));
        assert_eq!(surface.insert_row_below(), EditOutcome::Applied);
        let markup = surface.markup();
        assert!(markup.starts_with("<div><table>"));
        assert_eq!(Document::parse(&markup).table(0).map(|t| t.rows.len()), Some(2));

        assert_eq!(surface.delete_table(), EditOutcome::Applied);
        assert!(surface.document().body.is_empty());
    }

    #[test]
    fn test_paste_of_template_keeps_single_marker() {
        let other = build_document(&TemplateDefinition::new(vec![FieldDefinition::new("Other", 3)]));
        let mut surface = EditorSurface::open(&template(), EditMode::Free);
        let end = surface.document().body.len();
        assert_eq!(surface.paste(SurfacePoint::Block { block: end }, &other), EditOutcome::Applied);

        let markup = surface.markup();
        assert_eq!(markup.matches(crate::constants::MARKER_OPEN).count(), 1);
        let labels: Vec<String> = codec::decode(&markup)
            .unwrap()
            .fields()
            .iter()
            .map(|f| f.label.clone())
            .collect();
        assert_eq!(labels, vec!["Findings", "Impression"]);
        assert_eq!(surface.document().body.len(), end + 1);
    }

    #[test]
    fn test_table_only_paste_outside_cell_is_rejected_and_resynced() {
        let mut surface = EditorSurface::open("<table><tr><td>1</td></tr></table>", EditMode::TableOnly);
        surface.insert_text(SurfacePoint::cell(0, 0, 0), "2");
        surface.focus(SurfacePoint::cell(0, 0, 0));
        assert_eq!(
            surface.paste(SurfacePoint::Block { block: 1 }, "<p>stray</p>"),
            EditOutcome::Rejected
        );
        assert!(!surface.state().is_targeted());
        assert_eq!(surface.markup(), "<table><tbody><tr><td>12</td></tr></tbody></table>");
    }

    #[test]
    fn test_table_only_missing_cell_is_rejected() {
        let mut surface = EditorSurface::open("<table><tr><td>1</td></tr></table>", EditMode::TableOnly);
        assert_eq!(
            surface.insert_text(SurfacePoint::cell(0, 3, 0), "x"),
            EditOutcome::Rejected
        );
        assert_eq!(
            surface.paste(SurfacePoint::cell(1, 0, 0), "x"),
            EditOutcome::Rejected
        );
        assert_eq!(surface.markup(), "<table><tbody><tr><td>1</td></tr></tbody></table>");
    }
}
