//! Text entry and inline formatting.

use super::state::{SurfacePoint, TextSelection};
use super::EditOutcome;
use crate::markup::{Attrs, CellContent, Document, Element, Node};

/// Node list a point writes into: a cell's flow, one region of a split cell, the children of
/// a top-level element, or the end of the body.
pub(super) fn nodes_at_mut<'a>(
    doc: &'a mut Document,
    point: &SurfacePoint,
) -> Option<&'a mut Vec<Node>> {
    match *point {
        SurfacePoint::Cell {
            block,
            row,
            col,
            inner,
        } => {
            let cell = doc.table_mut(block)?.cell_mut(row, col)?;
            match &mut cell.content {
                CellContent::Flow(nodes) => Some(nodes),
                CellContent::Split(split) => split
                    .regions
                    .get_mut(inner.unwrap_or(0))
                    .map(|r| &mut r.content),
            }
        }
        SurfacePoint::Block { block } => {
            if block >= doc.body.len() {
                return Some(&mut doc.body);
            }
            match doc.body.get_mut(block) {
                Some(Node::Element(el)) if !Element::is_void_tag(&el.tag) => Some(&mut el.children),
                _ => None,
            }
        }
    }
}

/// Appends plain text at `point`, merging with a trailing text node.
pub fn insert_text(doc: &mut Document, point: &SurfacePoint, text: &str) -> EditOutcome {
    let Some(nodes) = nodes_at_mut(doc, point) else {
        return EditOutcome::NoTarget;
    };
    if text.is_empty() {
        return EditOutcome::Unchanged;
    }
    match nodes.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => nodes.push(Node::text(text)),
    }
    EditOutcome::Applied
}

/// Appends already-parsed nodes at `point`.
pub fn append_nodes(doc: &mut Document, point: &SurfacePoint, fragment: Vec<Node>) -> EditOutcome {
    let Some(nodes) = nodes_at_mut(doc, point) else {
        return EditOutcome::NoTarget;
    };
    if fragment.is_empty() {
        return EditOutcome::Unchanged;
    }
    nodes.extend(fragment);
    EditOutcome::Applied
}

/// Number of characters a selection can address under `point`.
pub fn selectable_len(doc: &mut Document, point: &SurfacePoint) -> Option<usize> {
    let nodes = nodes_at_mut(doc, point)?;
    Some(count_chars(nodes))
}

fn count_chars(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|n| match n {
            Node::Text(t) => t.chars().count(),
            Node::Element(el) => count_chars(&el.children),
            Node::Table(_) | Node::Comment(_) => 0,
        })
        .sum()
}

/// Wraps the selected characters in `<span style="font-size:{px}px">`.
///
/// Text nodes are split at the selection boundaries. A selection that crosses element
/// boundaries produces one span per text node it touches. Nested tables are not entered.
pub fn apply_font_size(doc: &mut Document, selection: &TextSelection, px: u16) -> EditOutcome {
    if selection.is_collapsed() {
        return EditOutcome::Unchanged;
    }
    let Some(nodes) = nodes_at_mut(doc, &selection.anchor) else {
        return EditOutcome::NoTarget;
    };

    let style = format!("font-size:{}px", px);
    let mut pos = 0usize;
    let mut touched = false;
    let current = std::mem::take(nodes);
    *nodes = wrap_range(
        current,
        selection.start,
        selection.end,
        &style,
        &mut pos,
        &mut touched,
    );

    if touched {
        EditOutcome::Applied
    } else {
        EditOutcome::Unchanged
    }
}

fn wrap_range(
    nodes: Vec<Node>,
    start: usize,
    end: usize,
    style: &str,
    pos: &mut usize,
    touched: &mut bool,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => {
                let len = text.chars().count();
                let from = start.max(*pos);
                let to = end.min(*pos + len);
                if from >= to {
                    out.push(Node::Text(text));
                } else {
                    let before: String = text.chars().take(from - *pos).collect();
                    let middle: String = text.chars().skip(from - *pos).take(to - from).collect();
                    let after: String = text.chars().skip(to - *pos).collect();
                    if !before.is_empty() {
                        out.push(Node::Text(before));
                    }
                    out.push(Node::Element(
                        Element::new("span")
                            .with_attrs(Attrs::new().with("style", style))
                            .with_children(vec![Node::Text(middle)]),
                    ));
                    if !after.is_empty() {
                        out.push(Node::Text(after));
                    }
                    *touched = true;
                }
                *pos += len;
            }
            Node::Element(mut el) => {
                let children = std::mem::take(&mut el.children);
                el.children = wrap_range(children, start, end, style, pos, touched);
                out.push(Node::Element(el));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{emit_nodes, parse_fragment};

    fn doc(markup: &str) -> Document {
        Document {
            marker: None,
            body: parse_fragment(markup),
        }
    }

    #[test]
    fn test_insert_text_into_cell_region_and_block() {
        let mut d = doc("<p>a</p><table><tr><td>x</td><td><table><tr><td>1</td><td>2</td></tr></table></td></tr></table>");
        assert_eq!(
            insert_text(&mut d, &SurfacePoint::cell(1, 0, 0), "y"),
            EditOutcome::Applied
        );
        assert_eq!(
            insert_text(&mut d, &SurfacePoint::region(1, 0, 1, 1), "3"),
            EditOutcome::Applied
        );
        assert_eq!(
            insert_text(&mut d, &SurfacePoint::Block { block: 0 }, "b"),
            EditOutcome::Applied
        );
        let out = emit_nodes(&d.body);
        assert!(out.starts_with("<p>ab</p>"));
        assert!(out.contains("<td>xy</td>"));
        assert!(out.contains("<td>23</td>"));
    }

    #[test]
    fn test_insert_text_at_end_of_body_and_missing_cell() {
        let mut d = doc("<p>a</p>");
        assert_eq!(
            insert_text(&mut d, &SurfacePoint::Block { block: 1 }, "tail"),
            EditOutcome::Applied
        );
        assert_eq!(d.body.last(), Some(&Node::text("tail")));
        assert_eq!(
            insert_text(&mut d, &SurfacePoint::cell(0, 0, 0), "x"),
            EditOutcome::NoTarget
        );
    }

    #[test]
    fn test_apply_font_size_splits_text_nodes() {
        let mut d = doc("<p>hello world</p>");
        let selection = TextSelection {
            anchor: SurfacePoint::Block { block: 0 },
            start: 6,
            end: 11,
        };
        assert_eq!(apply_font_size(&mut d, &selection, 14), EditOutcome::Applied);
        assert_eq!(
            emit_nodes(&d.body),
            "<p>hello <span style=\"font-size:14px\">world</span></p>"
        );
    }

    #[test]
    fn test_apply_font_size_across_elements() {
        let mut d = doc("<p>ab<b>cd</b>ef</p>");
        let selection = TextSelection {
            anchor: SurfacePoint::Block { block: 0 },
            start: 1,
            end: 5,
        };
        apply_font_size(&mut d, &selection, 20);
        assert_eq!(
            emit_nodes(&d.body),
            "<p>a<span style=\"font-size:20px\">b</span><b><span style=\"font-size:20px\">cd</span></b><span style=\"font-size:20px\">e</span>f</p>"
        );
    }

    #[test]
    fn test_apply_font_size_collapsed_selection_is_unchanged() {
        let mut d = doc("<p>abc</p>");
        let before = d.clone();
        let selection = TextSelection {
            anchor: SurfacePoint::Block { block: 0 },
            start: 2,
            end: 2,
        };
        assert_eq!(apply_font_size(&mut d, &selection, 14), EditOutcome::Unchanged);
        assert_eq!(d, before);
    }

    #[test]
    fn test_selectable_len_counts_characters() {
        let mut d = doc("<p>né<b>e</b></p>");
        assert_eq!(selectable_len(&mut d, &SurfacePoint::Block { block: 0 }), Some(3));
    }
}
