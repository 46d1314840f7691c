//! Field-template marker codec.
//!
//! A field-template document carries its own definition: a comment block fenced by
//! [`MARKER_OPEN`] and [`MARKER_CLOSE`] whose payload is JSON of the form
//! `{"fields":[{"id":…,"label":…,"parts":…}]}`. The rendered table follows the marker, and
//! anything else in the document is free-form markup.
//!
//! Decoding is fail-soft. A missing, unterminated or unparsable marker yields `None` so the
//! caller falls back to free-form handling, and individual entries are repaired rather than
//! rejected.

use crate::constants::{MARKER_CLOSE, MARKER_OPEN};
use report_types::{FieldId, Parts};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One named slot in a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub label: String,
    pub parts: Parts,
}

impl FieldDefinition {
    /// New field with a freshly generated id.
    pub fn new(label: impl Into<String>, parts: i64) -> Self {
        Self {
            id: FieldId::generate(),
            label: label.into(),
            parts: Parts::clamped(parts),
        }
    }

    /// Unlabelled single-part field, used wherever a template would otherwise be empty.
    pub fn blank() -> Self {
        Self::new("", 1)
    }
}

/// Ordered, never-empty list of field definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDefinition {
    fields: Vec<FieldDefinition>,
}

impl TemplateDefinition {
    /// Wraps `fields`, materialising a single blank field if the list is empty.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        if fields.is_empty() {
            return Self {
                fields: vec![FieldDefinition::blank()],
            };
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FieldDefinition> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Mutable access for in-crate editors. Callers must leave at least one field behind.
    pub(crate) fn fields_mut(&mut self) -> &mut Vec<FieldDefinition> {
        &mut self.fields
    }
}

impl Default for TemplateDefinition {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A document split around its marker block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerSplit<'a> {
    /// Markup preceding the marker (normally empty).
    pub before: &'a str,
    /// Raw payload between the fences.
    pub payload: &'a str,
    /// Markup following the marker.
    pub after: &'a str,
}

/// Locates the marker block. Returns `None` if there is no opening fence or it is never
/// closed.
pub fn split_marker(markup: &str) -> Option<MarkerSplit<'_>> {
    let start = markup.find(MARKER_OPEN)?;
    let payload_start = start + MARKER_OPEN.len();
    let payload_len = markup[payload_start..].find(MARKER_CLOSE)?;
    let payload_end = payload_start + payload_len;

    Some(MarkerSplit {
        before: &markup[..start],
        payload: &markup[payload_start..payload_end],
        after: &markup[payload_end + MARKER_CLOSE.len()..],
    })
}

/// True if `markup` contains a complete marker block (decodable or not).
pub fn has_marker(markup: &str) -> bool {
    split_marker(markup).is_some()
}

/// True for comment text (the part between `<!--` and `-->`) that belongs to a marker block.
pub fn is_marker_comment(comment: &str) -> bool {
    MARKER_OPEN
        .strip_prefix("<!--")
        .is_some_and(|prefix| comment.starts_with(prefix))
}

/// Returns `markup` without its marker block.
pub fn strip_marker(markup: &str) -> String {
    match split_marker(markup) {
        Some(split) => format!("{}{}", split.before, split.after),
        None => markup.to_string(),
    }
}

/// Serialises a definition into a marker block.
///
/// Only `id`, `label` and `parts` are written. `<`, `>` and `&` are emitted as JSON unicode
/// escapes, which keeps labels from ever closing the comment early.
pub fn encode(definition: &TemplateDefinition) -> String {
    let fields: Vec<Value> = definition
        .fields()
        .iter()
        .map(|f| {
            json!({
                "id": f.id.as_str(),
                "label": f.label,
                "parts": f.parts.get(),
            })
        })
        .collect();

    let payload = json!({ "fields": fields })
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026");

    format!("{}{}{}", MARKER_OPEN, payload, MARKER_CLOSE)
}

/// Decodes the definition embedded in `markup`, if any.
pub fn decode(markup: &str) -> Option<TemplateDefinition> {
    match split_marker(markup) {
        Some(split) => decode_payload(split.payload),
        None => {
            if markup.contains(MARKER_OPEN) {
                tracing::debug!("field-template marker is unterminated; treating as free-form");
            }
            None
        }
    }
}

/// Decodes a raw marker payload.
///
/// Accepts `{"fields":[…]}` or a bare array. Entries without a string `label` are dropped,
/// `parts` is coerced into range and missing ids are generated. If no entry survives, a single
/// blank field is synthesised.
pub fn decode_payload(payload: &str) -> Option<TemplateDefinition> {
    let value: Value = match serde_json::from_str(payload.trim()) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("field-template marker payload is not JSON: {}", e);
            return None;
        }
    };

    let entries = match &value {
        Value::Object(map) => map.get("fields").and_then(Value::as_array),
        Value::Array(entries) => Some(entries),
        _ => None,
    };
    let Some(entries) = entries else {
        tracing::debug!("field-template marker payload has no fields array");
        return None;
    };

    let fields: Vec<FieldDefinition> = entries.iter().filter_map(field_from_value).collect();
    if fields.len() < entries.len() {
        tracing::debug!(
            "dropped {} field-template entries without a label",
            entries.len() - fields.len()
        );
    }

    Some(TemplateDefinition::new(fields))
}

fn field_from_value(value: &Value) -> Option<FieldDefinition> {
    let obj = value.as_object()?;
    let label = obj.get("label")?.as_str()?.to_string();
    let parts = coerce_parts(obj.get("parts"));
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| FieldId::new(s).ok())
        .unwrap_or_else(FieldId::generate);

    Some(FieldDefinition { id, label, parts })
}

fn coerce_parts(value: Option<&Value>) -> Parts {
    let n = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64),
        _ => None,
    };
    n.map(Parts::clamped).unwrap_or_default()
}
