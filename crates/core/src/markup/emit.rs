//! Markup emitter: turns the typed model back into markup text.
//!
//! Text and attribute values are always escaped with `html-escape`; only the children of
//! `script`/`style` elements are written verbatim. Split cells are written as the nested tables they were
//! parsed from, so a document survives parse → emit → parse unchanged.

use super::{Attrs, Cell, CellContent, Document, Node, Orientation, Region, SplitCell, Table};
use crate::codec;
use crate::constants::HIGHLIGHT_STYLE;

/// Cell (and optionally split region) to mark as active in editor previews.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Highlight {
    pub block: usize,
    pub row: usize,
    pub col: usize,
    pub region: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct EmitOptions {
    /// When set, the addressed cell or region gets `data-active="true"` and an outline.
    pub highlight: Option<Highlight>,
}

pub fn emit_document(doc: &Document, options: &EmitOptions) -> String {
    let mut out = String::new();
    if let Some(definition) = &doc.marker {
        out.push_str(&codec::encode(definition));
    }
    for (block, node) in doc.body.iter().enumerate() {
        // A wrapper block highlights the first table inside it, matching `Document::table`.
        let mut highlight = options.highlight.filter(|h| h.block == block);
        emit_node(&mut out, node, false, &mut highlight);
    }
    out
}

/// Emits a node list with no highlighting.
pub fn emit_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        emit_node(&mut out, node, false, &mut None);
    }
    out
}

fn emit_node(out: &mut String, node: &Node, raw_text: bool, highlight: &mut Option<Highlight>) {
    match node {
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Table(table) => emit_table(out, table, highlight.take()),
        Node::Element(el) => {
            emit_open(out, &el.tag, &el.attrs);
            if super::Element::is_void_tag(&el.tag) {
                return;
            }
            let raw = matches!(el.tag.as_str(), "script" | "style");
            for child in &el.children {
                emit_node(out, child, raw, highlight);
            }
            emit_close(out, &el.tag);
        }
    }
}

fn emit_open(out: &mut String, tag: &str, attrs: &Attrs) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs.iter() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');
}

fn emit_close(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn highlighted(attrs: &Attrs) -> Attrs {
    let mut attrs = attrs.clone();
    let style = match attrs.get("style") {
        Some(existing) if !existing.is_empty() => {
            let sep = if existing.trim_end().ends_with(';') { "" } else { ";" };
            format!("{}{}{}", existing, sep, HIGHLIGHT_STYLE)
        }
        _ => HIGHLIGHT_STYLE.to_string(),
    };
    attrs.set("style", style);
    attrs.set("data-active", "true");
    attrs
}

fn emit_table(out: &mut String, table: &Table, highlight: Option<Highlight>) {
    emit_open(out, "table", &table.attrs);
    out.push_str("<tbody>");
    for (r, row) in table.rows.iter().enumerate() {
        emit_open(out, "tr", &row.attrs);
        for (c, cell) in row.cells.iter().enumerate() {
            let active = highlight.filter(|h| h.row == r && h.col == c);
            emit_cell(out, cell, active);
        }
        emit_close(out, "tr");
    }
    out.push_str("</tbody>");
    emit_close(out, "table");
}

fn emit_cell(out: &mut String, cell: &Cell, active: Option<Highlight>) {
    let tag = cell.kind.tag();
    let region_target = match (&cell.content, active) {
        (CellContent::Split(split), Some(h)) => h.region.filter(|r| *r < split.regions.len()),
        _ => None,
    };

    if active.is_some() && region_target.is_none() {
        emit_open(out, tag, &highlighted(&cell.attrs));
    } else {
        emit_open(out, tag, &cell.attrs);
    }

    match &cell.content {
        CellContent::Flow(nodes) => {
            for node in nodes {
                emit_node(out, node, false, &mut None);
            }
        }
        CellContent::Split(split) => emit_split(out, split, region_target),
    }
    emit_close(out, tag);
}

fn emit_split(out: &mut String, split: &SplitCell, active_region: Option<usize>) {
    emit_open(out, "table", &split.attrs);
    out.push_str("<tbody>");

    let emit_region = |out: &mut String, idx: usize, region: &Region| {
        if active_region == Some(idx) {
            emit_open(out, "td", &highlighted(&region.attrs));
        } else {
            emit_open(out, "td", &region.attrs);
        }
        for node in &region.content {
            emit_node(out, node, false, &mut None);
        }
        emit_close(out, "td");
    };

    match split.orientation {
        Orientation::Vertical => {
            out.push_str("<tr>");
            for (idx, region) in split.regions.iter().enumerate() {
                emit_region(out, idx, region);
            }
            out.push_str("</tr>");
        }
        Orientation::Horizontal => {
            for (idx, region) in split.regions.iter().enumerate() {
                out.push_str("<tr>");
                emit_region(out, idx, region);
                out.push_str("</tr>");
            }
        }
    }

    out.push_str("</tbody>");
    emit_close(out, "table");
}
