//! Typed model of report markup.
//!
//! Template documents are stored as a single block of HTML-like markup. Rather than sniffing
//! strings, every consumer works on [`Document`], which separates the embedded field-template
//! marker from the free-form body and represents tables structurally.
//!
//! A cell that has been subdivided holds [`CellContent::Split`] instead of a nested table in
//! its flow content. Structural table operations therefore only ever see outer cells, and the
//! regions of a split are addressed through the cell that owns them.

mod emit;
mod parser;

pub use emit::{emit_document, emit_nodes, EmitOptions, Highlight};
pub use parser::{parse_document, parse_fragment};

use crate::codec::{self, TemplateDefinition};

/// A parsed template or result document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Field definition carried by the marker block, if the document has one.
    pub marker: Option<TemplateDefinition>,
    /// Everything after (and around) the marker.
    pub body: Vec<Node>,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        parse_document(markup)
    }

    /// Serialises the document back to markup, marker first.
    pub fn to_markup(&self) -> String {
        emit_document(self, &EmitOptions::default())
    }

    /// Table addressed by top-level `block`: the block itself when it is a table, otherwise
    /// the first table inside the wrapper element (`div`, `figure`) at that block.
    pub fn table(&self, block: usize) -> Option<&Table> {
        match self.body.get(block)? {
            Node::Table(table) => Some(table),
            Node::Element(el) => find_first_table(&el.children),
            Node::Text(_) | Node::Comment(_) => None,
        }
    }

    pub fn table_mut(&mut self, block: usize) -> Option<&mut Table> {
        match self.body.get_mut(block)? {
            Node::Table(table) => Some(table),
            Node::Element(el) => find_first_table_mut(&mut el.children),
            Node::Text(_) | Node::Comment(_) => None,
        }
    }

    /// Removes the table addressed by `block`. A wrapper left with nothing visible goes too.
    pub fn remove_table(&mut self, block: usize) -> bool {
        let drop_block = match self.body.get_mut(block) {
            Some(Node::Table(_)) => true,
            Some(Node::Element(el)) => {
                if !remove_first_table(&mut el.children) {
                    return false;
                }
                is_blank(&el.children)
            }
            _ => return false,
        };
        if drop_block {
            self.body.remove(block);
        }
        true
    }

    /// First table found depth-first anywhere in the body.
    pub fn first_table(&self) -> Option<&Table> {
        find_first_table(&self.body)
    }
}

fn find_first_table(nodes: &[Node]) -> Option<&Table> {
    for node in nodes {
        match node {
            Node::Table(table) => return Some(table),
            Node::Element(el) => {
                if let Some(found) = find_first_table(&el.children) {
                    return Some(found);
                }
            }
            Node::Text(_) | Node::Comment(_) => {}
        }
    }
    None
}

fn find_first_table_mut(nodes: &mut [Node]) -> Option<&mut Table> {
    for node in nodes {
        match node {
            Node::Table(table) => return Some(table),
            Node::Element(el) => {
                if let Some(found) = find_first_table_mut(&mut el.children) {
                    return Some(found);
                }
            }
            Node::Text(_) | Node::Comment(_) => {}
        }
    }
    None
}

fn remove_first_table(nodes: &mut Vec<Node>) -> bool {
    for i in 0..nodes.len() {
        if matches!(nodes[i], Node::Table(_)) {
            nodes.remove(i);
            return true;
        }
        if let Node::Element(el) = &mut nodes[i] {
            if remove_first_table(&mut el.children) {
                return true;
            }
        }
    }
    false
}

fn is_blank(nodes: &[Node]) -> bool {
    nodes.iter().all(|n| match n {
        Node::Text(t) => t.trim().is_empty(),
        Node::Comment(_) => true,
        Node::Element(el) => !Element::is_void_tag(&el.tag) && is_blank(&el.children),
        Node::Table(_) => false,
    })
}

/// Drops field-template marker comments anywhere in `nodes`, including inside tables.
pub fn strip_marker_comments(nodes: &mut Vec<Node>) {
    nodes.retain(|n| !matches!(n, Node::Comment(c) if codec::is_marker_comment(c)));
    for node in nodes.iter_mut() {
        match node {
            Node::Element(el) => strip_marker_comments(&mut el.children),
            Node::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    match &mut cell.content {
                        CellContent::Flow(nodes) => strip_marker_comments(nodes),
                        CellContent::Split(split) => {
                            for region in &mut split.regions {
                                strip_marker_comments(&mut region.content);
                            }
                        }
                    }
                }
            }
            Node::Text(_) | Node::Comment(_) => {}
        }
    }
}

/// Ordered attribute list. Order is preserved so documents round-trip stably.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style constructor for a single attribute.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value,
            None => self.0.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(pos).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push_raw(&mut self, name: String, value: String) {
        if self.get(&name).is_none() {
            self.0.push((name, value));
        }
    }
}

/// One node of body content.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Unescaped text.
    Text(String),
    /// Any non-table element (paragraphs, runs, line breaks, images by reference).
    Element(Element),
    Table(Table),
    /// Comment other than the field-template marker.
    Comment(String),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Concatenated text content, without markup.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(std::slice::from_ref(self), &mut out);
        out
    }
}

/// Concatenated text content of a node list.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) if el.tag == "br" => out.push('\n'),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        match &cell.content {
                            CellContent::Flow(nodes) => collect_text(nodes, out),
                            CellContent::Split(split) => {
                                for region in &split.regions {
                                    collect_text(&region.content, out);
                                }
                            }
                        }
                    }
                }
            }
            Node::Comment(_) => {}
        }
    }
}

/// A generic element. Tag names are stored lowercase.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Attrs,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void_tag(tag: &str) -> bool {
        matches!(
            tag,
            "br" | "img" | "hr" | "input" | "meta" | "link" | "col" | "wbr" | "source" | "area"
        )
    }
}

/// A rectangular table. `thead`/`tbody`/`tfoot` groupings are flattened into `rows`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub attrs: Attrs,
    pub rows: Vec<Row>,
}

impl Table {
    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.cells.get(col)
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row)?.cells.get_mut(col)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub attrs: Attrs,
    pub cells: Vec<Cell>,
}

impl Row {
    /// Row of `count` blank cells of the given kind.
    pub fn blank(count: usize, kind: CellKind) -> Self {
        Self {
            attrs: Attrs::new(),
            cells: (0..count).map(|_| Cell::blank(kind)).collect(),
        }
    }

    /// True when the row has cells and every one is a header cell.
    pub fn is_header_row(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.kind == CellKind::Header)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// `td`
    Data,
    /// `th`
    Header,
}

impl CellKind {
    pub fn tag(self) -> &'static str {
        match self {
            CellKind::Data => "td",
            CellKind::Header => "th",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub attrs: Attrs,
    pub content: CellContent,
}

impl Cell {
    pub fn blank(kind: CellKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: CellContent::Flow(Vec::new()),
        }
    }

    pub fn with_text(kind: CellKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: CellContent::Flow(vec![Node::text(text)]),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Split state of this cell, if it is subdivided into two or more regions.
    pub fn split(&self) -> Option<&SplitCell> {
        match &self.content {
            CellContent::Split(split) if split.regions.len() >= 2 => Some(split),
            _ => None,
        }
    }
}

/// What a cell holds: ordinary flow content, or a subdivision into independent regions.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Flow(Vec<Node>),
    Split(SplitCell),
}

/// Direction in which a cell is subdivided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Regions side by side (`1 × n`).
    Vertical,
    /// Regions stacked (`n × 1`).
    Horizontal,
}

/// A cell subdivided into independently editable regions.
///
/// Regions are not structural targets: row/column operations act on the owning cell.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitCell {
    /// Attributes of the nested table that carries the split.
    pub attrs: Attrs,
    pub orientation: Orientation,
    pub regions: Vec<Region>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    pub attrs: Attrs,
    pub content: Vec<Node>,
}
