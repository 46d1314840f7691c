//! Markup parser.
//!
//! Tokenising and tree construction are delegated to `html5ever`, which applies the HTML
//! parsing rules editors rely on (implicit cell and row closes, stray end tags ignored, the
//! full named character reference table). The resulting DOM is then lowered into the typed
//! [`Node`] model, where tables and split cells become structural.
//!
//! Malformed input never fails.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment as parse_html_fragment, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{
    find_first_table, strip_marker_comments, Attrs, Cell, CellContent, CellKind, Document, Element,
    Node, Orientation, Region, Row, SplitCell, Table,
};
use crate::codec;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parses a complete document, lifting the field-template marker out of the body.
///
/// A marker that cannot be decoded is left in place and ends up as an ordinary comment, so
/// the document is treated as free-form. Once a marker is lifted, any further marker
/// comments are dropped so the document never carries two.
pub fn parse_document(markup: &str) -> Document {
    let markup = markup.strip_prefix('\u{feff}').unwrap_or(markup);

    if let Some(split) = codec::split_marker(markup) {
        if let Some(definition) = codec::decode_payload(split.payload) {
            let mut body = parse_fragment(split.before);
            body.extend(parse_fragment(split.after));
            strip_marker_comments(&mut body);
            return Document {
                marker: Some(definition),
                body,
            };
        }
    }

    Document {
        marker: None,
        body: parse_fragment(markup),
    }
}

/// Parses a markup fragment into body nodes. Marker comments are not interpreted.
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    if markup.is_empty() {
        return Vec::new();
    }
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_html_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(markup);

    // Fragment parsing yields document -> <html> -> content.
    let document_children = dom.document.children.borrow();
    let nodes = document_children
        .iter()
        .find(|h| matches!(h.data, NodeData::Element { .. }))
        .map(lower_children)
        .unwrap_or_default();
    nodes
}

fn lower_children(handle: &Handle) -> Vec<Node> {
    handle.children.borrow().iter().filter_map(lower).collect()
}

fn lower(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Element { .. } => {
            let (tag, attrs) = element_parts(handle)?;
            if tag == "table" {
                return Some(Node::Table(lower_table(handle, attrs)));
            }
            Some(Node::Element(Element {
                tag,
                attrs,
                children: lower_children(handle),
            }))
        }
        _ => None,
    }
}

/// Lowered tag name and attributes of an element handle.
fn element_parts(handle: &Handle) -> Option<(String, Attrs)> {
    let NodeData::Element { name, attrs, .. } = &handle.data else {
        return None;
    };
    let mut lowered = Attrs::new();
    for attr in attrs.borrow().iter() {
        lowered.push_raw(attr.name.local.to_string(), attr.value.to_string());
    }
    Some((name.local.to_string(), lowered))
}

fn lower_table(handle: &Handle, attrs: Attrs) -> Table {
    let mut rows = Vec::new();
    for child in handle.children.borrow().iter() {
        let Some((tag, _)) = element_parts(child) else {
            continue;
        };
        match tag.as_str() {
            "tr" => rows.push(lower_row(child)),
            "thead" | "tbody" | "tfoot" => {
                for section_child in child.children.borrow().iter() {
                    if matches!(element_parts(section_child), Some((tag, _)) if tag == "tr") {
                        rows.push(lower_row(section_child));
                    }
                }
            }
            _ => {}
        }
    }
    Table { attrs, rows }
}

fn lower_row(handle: &Handle) -> Row {
    let mut row = Row {
        attrs: element_parts(handle).map(|(_, a)| a).unwrap_or_default(),
        cells: Vec::new(),
    };
    for child in handle.children.borrow().iter() {
        let (kind, attrs) = match element_parts(child) {
            Some((tag, attrs)) if tag == "td" => (CellKind::Data, attrs),
            Some((tag, attrs)) if tag == "th" => (CellKind::Header, attrs),
            _ => continue,
        };
        row.cells.push(Cell {
            kind,
            attrs,
            content: detect_split(lower_children(child)),
        });
    }
    row
}

/// Recognises a cell whose only content is a `1 × n` or `n × 1` table of plain cells.
fn detect_split(content: Vec<Node>) -> CellContent {
    let significant: Vec<usize> = content
        .iter()
        .enumerate()
        .filter(|(_, n)| match n {
            Node::Text(t) => !t.trim().is_empty(),
            Node::Comment(_) => false,
            _ => true,
        })
        .map(|(i, _)| i)
        .collect();

    let [only] = significant.as_slice() else {
        return CellContent::Flow(content);
    };
    let Some(Node::Table(table)) = content.get(*only) else {
        return CellContent::Flow(content);
    };

    let plain = table.rows.iter().flat_map(|r| r.cells.iter()).all(|c| match &c.content {
        CellContent::Flow(nodes) => find_first_table(nodes).is_none(),
        CellContent::Split(_) => false,
    });
    if table.rows.is_empty() || !plain {
        return CellContent::Flow(content);
    }

    let orientation = if table.rows.len() == 1 && !table.rows[0].cells.is_empty() {
        Orientation::Vertical
    } else if table.rows.iter().all(|r| r.cells.len() == 1) {
        Orientation::Horizontal
    } else {
        return CellContent::Flow(content);
    };

    let mut content = content;
    let Node::Table(table) = content.swap_remove(*only) else {
        return CellContent::Flow(content);
    };

    let regions = table
        .rows
        .into_iter()
        .flat_map(|r| r.cells.into_iter())
        .map(|cell| Region {
            attrs: cell.attrs,
            content: match cell.content {
                CellContent::Flow(nodes) => nodes,
                CellContent::Split(_) => Vec::new(),
            },
        })
        .collect();

    CellContent::Split(SplitCell {
        attrs: table.attrs,
        orientation,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldDefinition, TemplateDefinition};
    use crate::constants::MARKER_OPEN;
    use crate::markup::text_content;

    fn only_table(nodes: &[Node]) -> &Table {
        match nodes {
            [Node::Table(t)] => t,
            other => panic!("expected a single table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_table() {
        let nodes = parse_fragment("<table><tbody><tr><td>a</td><td>b</td></tr><tr><th>c</th></tr></tbody></table>");
        let table = only_table(&nodes);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[1].cells[0].kind, CellKind::Header);
        assert_eq!(
            table.rows[0].cells[1].content,
            CellContent::Flow(vec![Node::text("b")])
        );
    }

    #[test]
    fn test_parse_implicitly_closed_cells_and_rows() {
        let nodes = parse_fragment("<table><tr><td>1<td>2<tr><td>3</table>");
        let table = only_table(&nodes);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 1);
    }

    #[test]
    fn test_parse_attributes_and_entities() {
        let nodes = parse_fragment(r#"<p class="note" data-x='1 &amp; 2' hidden>a &lt; b</p>"#);
        let Node::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.tag, "p");
        assert_eq!(p.attrs.get("class"), Some("note"));
        assert_eq!(p.attrs.get("data-x"), Some("1 & 2"));
        assert_eq!(p.attrs.get("hidden"), Some(""));
        assert_eq!(p.children, vec![Node::text("a < b")]);
    }

    #[test]
    fn test_parse_void_and_self_closing_elements() {
        let nodes = parse_fragment(r#"line<br>next<img src="scan.png"/>end"#);
        assert_eq!(nodes.len(), 5);
        assert!(matches!(&nodes[1], Node::Element(e) if e.tag == "br" && e.children.is_empty()));
        assert!(matches!(&nodes[3], Node::Element(e) if e.tag == "img" && e.attrs.get("src") == Some("scan.png")));
    }

    #[test]
    fn test_parse_vertical_split_cell() {
        let nodes = parse_fragment(
            "<table><tr><td><table class=\"split-cell\"><tr><td>left</td><td>right</td></tr></table></td></tr></table>",
        );
        let table = only_table(&nodes);
        let split = table.rows[0].cells[0].split().expect("cell should be split");
        assert_eq!(split.orientation, Orientation::Vertical);
        assert_eq!(split.regions.len(), 2);
        assert_eq!(split.regions[1].content, vec![Node::text("right")]);
    }

    #[test]
    fn test_parse_horizontal_split_cell() {
        let nodes = parse_fragment(
            "<table><tr><td><table><tr><td>top</td></tr><tr><td>bottom</td></tr></table></td></tr></table>",
        );
        let split = only_table(&nodes).rows[0].cells[0].split().expect("split");
        assert_eq!(split.orientation, Orientation::Horizontal);
        assert_eq!(split.regions.len(), 2);
    }

    #[test]
    fn test_parse_irregular_nested_table_stays_flow() {
        let nodes = parse_fragment(
            "<table><tr><td>x<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table></td></tr></table>",
        );
        let cell = &only_table(&nodes).rows[0].cells[0];
        assert!(matches!(&cell.content, CellContent::Flow(nodes) if nodes.len() == 2));
    }

    #[test]
    fn test_parse_stray_end_tags_are_ignored() {
        let nodes = parse_fragment("<b>bold</i></b></div>tail");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], Node::text("tail"));
    }

    #[test]
    fn test_parse_end_tag_does_not_escape_cell() {
        let nodes = parse_fragment("<div><table><tr><td><b>x</div></b></td></tr></table></div>");
        let Node::Element(div) = &nodes[0] else {
            panic!("expected div");
        };
        assert!(matches!(&div.children[..], [Node::Table(_)]));
    }

    #[test]
    fn test_parse_literal_angle_bracket_text() {
        let nodes = parse_fragment("a < b and c <3");
        assert_eq!(nodes, vec![Node::text("a < b and c <3")]);
    }

    #[test]
    fn test_parse_comment_preserved() {
        let nodes = parse_fragment("<!-- note -->x");
        assert_eq!(nodes, vec![Node::Comment(" note ".into()), Node::text("x")]);
    }

    #[test]
    fn test_parse_paragraph_closed_by_table() {
        let nodes = parse_fragment("<p>intro<table><tr><td>a</td></tr></table>");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[1], Node::Table(_)));
    }

    #[test]
    fn test_parse_document_without_marker() {
        let doc = parse_document("<p>free text</p>");
        assert!(doc.marker.is_none());
        assert_eq!(doc.body.len(), 1);
    }

    #[test]
    fn test_parse_document_keeps_corrupt_marker_as_comment() {
        let doc = parse_document("<!--FIELD_TEMPLATE:{not json:END_FIELD_TEMPLATE--><p>x</p>");
        assert!(doc.marker.is_none());
        assert!(matches!(&doc.body[0], Node::Comment(c) if c.starts_with("FIELD_TEMPLATE:")));
    }

    #[test]
    fn test_named_entities_decode_and_survive_roundtrip() {
        let doc = parse_document(
            "<p>Temp 37 &deg;C, volume 5 &micro;L &plusmn; 0.1, patient&rsquo;s note &copy;</p>",
        );
        assert_eq!(
            text_content(&doc.body),
            "Temp 37 \u{b0}C, volume 5 \u{b5}L \u{b1} 0.1, patient\u{2019}s note \u{a9}"
        );
        let markup = doc.to_markup();
        assert!(!markup.contains("&amp;"));
        assert_eq!(parse_document(&markup), doc);
    }

    #[test]
    fn test_parse_document_keeps_only_the_first_marker() {
        let first = codec::encode(&TemplateDefinition::new(vec![FieldDefinition::new("A", 1)]));
        let second = codec::encode(&TemplateDefinition::new(vec![FieldDefinition::new("B", 2)]));
        let doc = parse_document(&format!("{}<p>x</p>{}<p>y</p>", first, second));
        assert_eq!(doc.marker.as_ref().map(|d| d.fields()[0].label.as_str()), Some("A"));
        assert_eq!(doc.body.len(), 2);
        assert_eq!(doc.to_markup().matches(MARKER_OPEN).count(), 1);
    }
}
