//! Result renderer: filled form → print-ready markup.
//!
//! Output is a single `<div class="report-result">` fragment. Every piece of user text is
//! escaped, quotes included; legacy free-text results are passed through as stored.

use crate::constants::{
    RESULT_EMPTY_CLASS, RESULT_KEY_CELL_STYLE, RESULT_LABEL_STYLE, RESULT_TABLE_STYLE,
    RESULT_VALUE_CELL_STYLE, RESULT_WRAPPER_CLASS,
};
use crate::result::{ResultField, ResultFormData};

pub fn render_form_data(data: &ResultFormData) -> String {
    match data {
        ResultFormData::Structured(form) => render_fields(&form.fields),
        ResultFormData::Legacy(text) => text.clone(),
    }
}

/// Renders structured fields, grouped by trimmed label in first-seen order.
///
/// A group whose members all hold exactly two values becomes one heading over a shared
/// table. Any other group renders each member on its own.
pub fn render_fields(fields: &[ResultField]) -> String {
    let mut out = format!("<div class=\"{}\">", RESULT_WRAPPER_CLASS);

    for (label, members) in group_by_label(fields) {
        if members.iter().all(|f| f.values.len() == 2) {
            push_heading(&mut out, label);
            push_pair_table(&mut out, &members);
            continue;
        }
        for field in members {
            push_heading(&mut out, label);
            if field.values.len() == 2 {
                push_pair_table(&mut out, &[field]);
            } else {
                push_bullets(&mut out, field);
            }
        }
    }

    out.push_str("</div>");
    out
}

fn group_by_label(fields: &[ResultField]) -> Vec<(&str, Vec<&ResultField>)> {
    let mut groups: Vec<(&str, Vec<&ResultField>)> = Vec::new();
    for field in fields {
        let label = field.label.trim();
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(field),
            None => groups.push((label, vec![field])),
        }
    }
    groups
}

fn push_heading(out: &mut String, label: &str) {
    if label.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<div style=\"{}\">{}</div>",
        RESULT_LABEL_STYLE,
        html_escape::encode_quoted_attribute(label)
    ));
}

/// One row per field: first value as a bold right-aligned key, the rest after it.
fn push_pair_table(out: &mut String, fields: &[&ResultField]) {
    out.push_str(&format!("<table style=\"{}\"><tbody>", RESULT_TABLE_STYLE));
    for field in fields {
        out.push_str("<tr>");
        out.push_str(&format!(
            "<td style=\"{}\">{}</td>",
            RESULT_KEY_CELL_STYLE,
            html_escape::encode_quoted_attribute(field.value(0))
        ));
        let rest = if field.values.len() > 1 {
            &field.values[1..]
        } else {
            &[][..]
        };
        if rest.is_empty() {
            out.push_str(&format!("<td style=\"{}\"></td>", RESULT_VALUE_CELL_STYLE));
        }
        for value in rest {
            out.push_str(&format!(
                "<td style=\"{}\">{}</td>",
                RESULT_VALUE_CELL_STYLE,
                html_escape::encode_quoted_attribute(value)
            ));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn push_bullets(out: &mut String, field: &ResultField) {
    let items: Vec<&str> = field
        .values
        .iter()
        .flat_map(|v| v.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if items.is_empty() {
        out.push_str(&format!("<div class=\"{}\">&nbsp;</div>", RESULT_EMPTY_CLASS));
        return;
    }

    out.push_str("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(&html_escape::encode_quoted_attribute(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}
