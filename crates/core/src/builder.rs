//! Template builder: turns a field list into the editable, printable table.
//!
//! Each labelled field becomes one row: the label on the left and `parts` equal-width input
//! regions on the right. The definition itself travels in the marker block in front of the
//! table, so unlabelled fields survive even though they have no visible row.

use crate::codec::{self, FieldDefinition, TemplateDefinition};
use crate::constants::{
    FIELD_TABLE_CLASS, LABEL_CELL_STYLE, PLACEHOLDER_LABEL, SPLIT_TABLE_CLASS, TABLE_STYLE,
    VALUE_CELL_STYLE, VERTICAL_RULE,
};
use crate::markup::{
    Attrs, Cell, CellContent, CellKind, Document, Node, Orientation, Region, Row, SplitCell, Table,
};
use crate::{ReportError, ReportResult};
use report_types::{FieldId, Parts};

/// Builds the complete template markup: marker block followed by the field table.
pub fn build_document(fields: &TemplateDefinition) -> String {
    build_document_body(fields).to_markup()
}

/// Builds the typed document for `fields` without serialising it.
pub fn build_document_body(fields: &TemplateDefinition) -> Document {
    let mut rows: Vec<Row> = fields
        .fields()
        .iter()
        .filter(|f| !f.label.trim().is_empty())
        .map(|f| field_row(f.label.trim(), f.parts))
        .collect();

    if rows.is_empty() {
        rows.push(field_row(PLACEHOLDER_LABEL, Parts::default()));
    }

    let table = Table {
        attrs: Attrs::new()
            .with("class", FIELD_TABLE_CLASS)
            .with("style", TABLE_STYLE),
        rows,
    };

    Document {
        marker: Some(fields.clone()),
        body: vec![Node::Table(table)],
    }
}

fn field_row(label: &str, parts: Parts) -> Row {
    let label_cell =
        Cell::with_text(CellKind::Data, label).with_attrs(Attrs::new().with("style", LABEL_CELL_STYLE));

    let value_cell = Cell {
        kind: CellKind::Data,
        attrs: Attrs::new().with("style", VALUE_CELL_STYLE),
        content: CellContent::Split(value_regions(parts.get())),
    };

    Row {
        attrs: Attrs::new(),
        cells: vec![label_cell, value_cell],
    }
}

/// `1 × parts` split with equal widths and a rule between neighbours.
fn value_regions(parts: usize) -> SplitCell {
    let width = region_width(parts);
    let regions = (0..parts)
        .map(|idx| {
            let mut style = format!("width:{}%;padding:4px 8px;", width);
            if idx + 1 < parts {
                style.push_str(VERTICAL_RULE);
            }
            Region {
                attrs: Attrs::new().with("style", style),
                content: Vec::new(),
            }
        })
        .collect();

    SplitCell {
        attrs: Attrs::new()
            .with("class", SPLIT_TABLE_CLASS)
            .with("style", TABLE_STYLE),
        orientation: Orientation::Vertical,
        regions,
    }
}

pub(crate) fn region_width(parts: usize) -> String {
    let parts = parts.max(1);
    if 100 % parts == 0 {
        (100 / parts).to_string()
    } else {
        format!("{:.2}", 100.0 / parts as f64)
    }
}

/// Field list being authored before the first build.
///
/// Always holds at least one field. Indexes are positional and checked on every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateDraft {
    definition: TemplateDefinition,
}

impl TemplateDraft {
    /// New draft with a single blank field.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definition(definition: TemplateDefinition) -> Self {
        Self { definition }
    }

    /// Appends a field and returns its id.
    pub fn add_field(&mut self, label: impl Into<String>, parts: i64) -> FieldId {
        let field = FieldDefinition::new(label, parts);
        let id = field.id.clone();
        self.definition.fields_mut().push(field);
        id
    }

    /// Removes the field at `index`. Removing the last remaining field leaves a blank one.
    pub fn remove_field(&mut self, index: usize) -> ReportResult<FieldDefinition> {
        self.check_index(index)?;
        let fields = self.definition.fields_mut();
        let removed = fields.remove(index);
        if fields.is_empty() {
            fields.push(FieldDefinition::blank());
        }
        Ok(removed)
    }

    pub fn set_label(&mut self, index: usize, label: impl Into<String>) -> ReportResult<()> {
        self.check_index(index)?;
        self.definition.fields_mut()[index].label = label.into();
        Ok(())
    }

    /// Sets the part count, clamped into range. Returns the value actually stored.
    pub fn set_parts(&mut self, index: usize, parts: i64) -> ReportResult<Parts> {
        self.check_index(index)?;
        let parts = Parts::clamped(parts);
        self.definition.fields_mut()[index].parts = parts;
        Ok(parts)
    }

    /// Moves the field at `from` so it ends up at position `to`.
    pub fn move_field(&mut self, from: usize, to: usize) -> ReportResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let fields = self.definition.fields_mut();
        let field = fields.remove(from);
        fields.insert(to, field);
        Ok(())
    }

    pub fn definition(&self) -> &TemplateDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> TemplateDefinition {
        self.definition
    }

    pub fn to_markup(&self) -> String {
        build_document(&self.definition)
    }

    fn check_index(&self, index: usize) -> ReportResult<()> {
        let len = self.definition.len();
        if index >= len {
            return Err(ReportError::FieldIndexOutOfRange { index, len });
        }
        Ok(())
    }
}

/// Decodes the definition from `markup` into a draft, or starts a fresh one.
impl From<&str> for TemplateDraft {
    fn from(markup: &str) -> Self {
        codec::decode(markup)
            .map(Self::from_definition)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::text_content;

    fn definition(fields: &[(&str, i64)]) -> TemplateDefinition {
        TemplateDefinition::new(
            fields
                .iter()
                .map(|(label, parts)| FieldDefinition::new(*label, *parts))
                .collect(),
        )
    }

    fn visible_table(doc: &Document) -> &Table {
        doc.table(0).expect("builder output starts with the field table")
    }

    #[test]
    fn test_build_then_decode_reproduces_fields() {
        let fields = definition(&[("Findings", 1), ("Impression", 2)]);
        let markup = build_document(&fields);
        assert!(markup.starts_with(crate::constants::MARKER_OPEN));
        assert_eq!(codec::decode(&markup), Some(fields));
    }

    #[test]
    fn test_build_rows_have_label_and_split_value_cell() {
        let fields = definition(&[("Findings", 1), ("Impression", 2), ("Grid", 6)]);
        let doc = Document::parse(&build_document(&fields));
        let table = visible_table(&doc);
        assert_eq!(table.rows.len(), 3);

        let label = &table.rows[1].cells[0];
        assert_eq!(label.attrs.get("style"), Some(LABEL_CELL_STYLE));
        let CellContent::Flow(nodes) = &label.content else {
            panic!("label cell should hold text");
        };
        assert_eq!(text_content(nodes), "Impression");

        let split = table.rows[1].cells[1].split().expect("two-part field is split");
        assert_eq!(split.orientation, Orientation::Vertical);
        assert_eq!(split.regions.len(), 2);
        assert!(split.regions[0].attrs.get("style").unwrap().contains("width:50%"));
        assert!(split.regions[0].attrs.get("style").unwrap().contains(VERTICAL_RULE));
        assert!(!split.regions[1].attrs.get("style").unwrap().contains(VERTICAL_RULE));

        assert_eq!(table.rows[2].cells[1].split().unwrap().regions.len(), 6);
        assert!(table.rows[0].cells[1].split().is_none());
    }

    #[test]
    fn test_build_region_width_for_uneven_parts() {
        assert_eq!(region_width(3), "33.33");
        assert_eq!(region_width(4), "25");
        assert_eq!(region_width(1), "100");
    }

    #[test]
    fn test_empty_label_roundtrips_without_visible_row() {
        let fields = definition(&[("Findings", 1), ("", 2)]);
        let markup = build_document(&fields);
        assert_eq!(codec::decode(&markup), Some(fields));
        let doc = Document::parse(&markup);
        assert_eq!(visible_table(&doc).rows.len(), 1);
    }

    #[test]
    fn test_all_blank_labels_emit_placeholder_row() {
        let fields = definition(&[("", 3), ("   ", 1)]);
        let doc = Document::parse(&build_document(&fields));
        let table = visible_table(&doc);
        assert_eq!(table.rows.len(), 1);
        let CellContent::Flow(nodes) = &table.rows[0].cells[0].content else {
            panic!("label cell should hold text");
        };
        assert_eq!(text_content(nodes), PLACEHOLDER_LABEL);
        assert_eq!(doc.marker.as_ref().map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_build_escapes_labels() {
        let fields = definition(&[("<script>alert(\"x\")</script>", 1)]);
        let markup = build_document(&fields);
        assert!(markup.contains("&lt;script&gt;alert(\"x\")&lt;/script&gt;"));
        assert!(!markup.contains("<script>"));
    }

    #[test]
    fn test_draft_starts_with_one_blank_field() {
        let draft = TemplateDraft::new();
        assert_eq!(draft.definition().len(), 1);
        assert_eq!(draft.definition().fields()[0].label, "");
    }

    #[test]
    fn test_draft_editing_operations() {
        let mut draft = TemplateDraft::new();
        draft.set_label(0, "Findings").unwrap();
        draft.add_field("Impression", 2);
        draft.add_field("Comment", 1);
        assert_eq!(draft.set_parts(2, 9).unwrap().get(), 6);

        draft.move_field(2, 0).unwrap();
        let labels: Vec<&str> = draft.definition().fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Comment", "Findings", "Impression"]);

        let removed = draft.remove_field(1).unwrap();
        assert_eq!(removed.label, "Findings");
        assert_eq!(draft.definition().len(), 2);
    }

    #[test]
    fn test_draft_remove_last_field_leaves_blank() {
        let mut draft = TemplateDraft::new();
        draft.set_label(0, "Only").unwrap();
        draft.remove_field(0).unwrap();
        assert_eq!(draft.definition().len(), 1);
        assert_eq!(draft.definition().fields()[0].label, "");
    }

    #[test]
    fn test_draft_rejects_out_of_range_index() {
        let mut draft = TemplateDraft::new();
        let err = draft.set_label(3, "x").unwrap_err();
        assert!(matches!(err, ReportError::FieldIndexOutOfRange { index: 3, len: 1 }));
        assert!(draft.move_field(0, 1).is_err());
        assert!(draft.remove_field(1).is_err());
    }

    #[test]
    fn test_draft_from_markup() {
        let fields = definition(&[("A", 2)]);
        let draft = TemplateDraft::from(build_document(&fields).as_str());
        assert_eq!(draft.definition(), &fields);
        assert_eq!(TemplateDraft::from("<p>free</p>").definition().len(), 1);
    }
}
