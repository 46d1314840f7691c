//! # Result Form Model
//!
//! A filled-in report is either structured, with one [`ResultField`] per template field, or
//! legacy free text for tests whose template has no field definition. Structured data is
//! derived from the template's marker when entry starts and round-trips through JSON as the
//! persisted `form_data` payload.
//!
//! Restored data is taken as found: fields with the wrong number of values stay editable,
//! and the renderer reads missing entries as empty strings.

use crate::codec::{self, TemplateDefinition};
use crate::editor::reduce_to_first_table;
use crate::{ReportError, ReportResult};
use report_types::Parts;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Values entered for one template field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ResultFieldWire")]
pub struct ResultField {
    pub id: String,
    pub label: String,
    pub values: Vec<String>,
}

impl ResultField {
    /// Value at `part`, or an empty string when it was never entered.
    pub fn value(&self, part: usize) -> &str {
        self.values.get(part).map(String::as_str).unwrap_or("")
    }
}

/// Saved shape of a result field, including records written before `values` existed.
#[derive(Deserialize)]
struct ResultFieldWire {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    label: Value,
    #[serde(default)]
    values: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

impl From<ResultFieldWire> for ResultField {
    fn from(wire: ResultFieldWire) -> Self {
        let values = match wire.values {
            Some(Value::Array(items)) => items.into_iter().map(scalar_to_string).collect(),
            Some(Value::Null) | None => vec![wire.value.map(scalar_to_string).unwrap_or_default()],
            Some(other) => vec![scalar_to_string(other)],
        };
        Self {
            id: scalar_to_string(wire.id),
            label: scalar_to_string(wire.label),
            values,
        }
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    FieldTemplate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFormData {
    pub kind: FormKind,
    #[serde(default)]
    pub fields: Vec<ResultField>,
}

/// Persisted `form_data` payload of a result record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultFormData {
    Structured(StructuredFormData),
    /// Rich text entered without a field template.
    Legacy(String),
}

impl ResultFormData {
    pub fn structured(fields: Vec<ResultField>) -> Self {
        ResultFormData::Structured(StructuredFormData {
            kind: FormKind::FieldTemplate,
            fields,
        })
    }

    /// Normalises the payload for storage. Legacy text containing a table is cut down to
    /// that table.
    pub fn prepared_for_save(self) -> Self {
        match self {
            ResultFormData::Legacy(text) => match reduce_to_first_table(&text) {
                Some(table) => ResultFormData::Legacy(table),
                None => ResultFormData::Legacy(text),
            },
            structured => structured,
        }
    }
}

/// Fields that share a heading when laid out for entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutGroup {
    /// Trimmed label shared by every member.
    pub label: String,
    /// Indexes into [`ResultForm::fields`], in template order.
    pub members: Vec<usize>,
}

/// An in-progress result entry session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultForm {
    Structured { fields: Vec<ResultField> },
    Legacy { text: String },
}

impl ResultForm {
    /// Fresh form for `definition`: one field per definition with `parts` empty values.
    pub fn seed(definition: &TemplateDefinition) -> Self {
        let fields = definition
            .fields()
            .iter()
            .map(|f| ResultField {
                id: f.id.as_str().to_string(),
                label: f.label.clone(),
                values: vec![String::new(); f.parts.get()],
            })
            .collect();
        ResultForm::Structured { fields }
    }

    /// Restores a previously saved payload verbatim.
    pub fn restore(data: ResultFormData) -> Self {
        match data {
            ResultFormData::Structured(form) => ResultForm::Structured {
                fields: form.fields,
            },
            ResultFormData::Legacy(text) => ResultForm::Legacy { text },
        }
    }

    /// Starts entry for a test, given its template markup and any saved result.
    ///
    /// A saved structured result wins. Otherwise a decodable template seeds a fresh form, and
    /// failing that the session falls back to free text: the saved text if there is one,
    /// else the template body.
    pub fn start(markup: &str, prior: Option<ResultFormData>) -> Self {
        match prior {
            Some(data @ ResultFormData::Structured(_)) => Self::restore(data),
            prior => match codec::decode(markup) {
                Some(definition) => Self::seed(&definition),
                None => {
                    let text = match prior {
                        Some(ResultFormData::Legacy(text)) => text,
                        _ => codec::strip_marker(markup),
                    };
                    ResultForm::Legacy { text }
                }
            },
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ResultForm::Structured { .. })
    }

    /// Structured fields; empty for free-text forms.
    pub fn fields(&self) -> &[ResultField] {
        match self {
            ResultForm::Structured { fields } => fields,
            ResultForm::Legacy { .. } => &[],
        }
    }

    /// Sets one value, padding the field's values with empty strings if it is short.
    pub fn set_value(
        &mut self,
        field_index: usize,
        part: usize,
        text: impl Into<String>,
    ) -> ReportResult<()> {
        let ResultForm::Structured { fields } = self else {
            return Err(ReportError::InvalidInput(
                "free-text results have no fields".into(),
            ));
        };
        let max = Parts::MAX as usize;
        if part >= max {
            return Err(ReportError::PartOutOfRange { part, max });
        }
        let len = fields.len();
        let field = fields
            .get_mut(field_index)
            .ok_or(ReportError::FieldIndexOutOfRange {
                index: field_index,
                len,
            })?;
        if field.values.len() <= part {
            field.values.resize(part + 1, String::new());
        }
        field.values[part] = text.into();
        Ok(())
    }

    /// Replaces the text of a free-text form.
    pub fn set_text(&mut self, text: impl Into<String>) -> ReportResult<()> {
        match self {
            ResultForm::Legacy { text: current } => {
                *current = text.into();
                Ok(())
            }
            ResultForm::Structured { .. } => Err(ReportError::InvalidInput(
                "structured results are edited per field".into(),
            )),
        }
    }

    /// Groups fields for entry layout.
    ///
    /// Two-valued fields with the same trimmed label share a group; everything else stands
    /// alone. Groups appear in order of their first member.
    pub fn layout_groups(&self) -> Vec<LayoutGroup> {
        let mut groups: Vec<LayoutGroup> = Vec::new();
        let mut paired: Vec<(String, usize)> = Vec::new();

        for (idx, field) in self.fields().iter().enumerate() {
            let label = field.label.trim().to_string();
            if field.values.len() == 2 {
                if let Some((_, group)) = paired.iter().find(|(l, _)| *l == label) {
                    groups[*group].members.push(idx);
                    continue;
                }
                paired.push((label.clone(), groups.len()));
            }
            groups.push(LayoutGroup {
                label,
                members: vec![idx],
            });
        }
        groups
    }

    pub fn into_form_data(self) -> ResultFormData {
        match self {
            ResultForm::Structured { fields } => ResultFormData::structured(fields),
            ResultForm::Legacy { text } => ResultFormData::Legacy(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_document;
    use crate::codec::FieldDefinition;

    fn scenario() -> TemplateDefinition {
        TemplateDefinition::new(vec![
            FieldDefinition::new("Findings", 1),
            FieldDefinition::new("Impression", 2),
        ])
    }

    #[test]
    fn test_seed_matches_parts() {
        let form = ResultForm::seed(&scenario());
        let values: Vec<Vec<String>> = form.fields().iter().map(|f| f.values.clone()).collect();
        assert_eq!(values, vec![vec![String::new()], vec![String::new(), String::new()]]);
        assert_eq!(form.fields()[1].label, "Impression");
    }

    #[test]
    fn test_set_value_pads_and_validates() {
        let mut form = ResultForm::seed(&scenario());
        form.set_value(0, 3, "late").unwrap();
        assert_eq!(form.fields()[0].values, vec!["", "", "", "late"]);

        assert!(matches!(
            form.set_value(0, 6, "x"),
            Err(ReportError::PartOutOfRange { part: 6, max: 6 })
        ));
        assert!(matches!(
            form.set_value(5, 0, "x"),
            Err(ReportError::FieldIndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_form_data_json_shape() {
        let mut form = ResultForm::seed(&scenario());
        form.set_value(0, 0, "Normal").unwrap();
        let json = serde_json::to_value(form.into_form_data()).unwrap();
        assert_eq!(json["kind"], "field_template");
        assert_eq!(json["fields"][0]["values"][0], "Normal");
        assert_eq!(json["fields"][1]["values"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_restore_coerces_legacy_field_shapes() {
        let data: ResultFormData = serde_json::from_str(
            r#"{"kind":"field_template","fields":[
                {"id":"a","label":"Hb","value":13.5},
                {"id":"b","label":"Flag","values":[true,null,"x"]},
                {"label":"Bare"}
            ]}"#,
        )
        .unwrap();
        let form = ResultForm::restore(data);
        assert_eq!(form.fields()[0].values, vec!["13.5"]);
        assert_eq!(form.fields()[1].values, vec!["true", "", "x"]);
        assert_eq!(form.fields()[2].id, "");
        assert_eq!(form.fields()[2].values, vec![""]);
    }

    #[test]
    fn test_plain_string_form_data_is_legacy() {
        let data: ResultFormData = serde_json::from_str(r#""<p>free</p>""#).unwrap();
        assert_eq!(data, ResultFormData::Legacy("<p>free</p>".into()));
        assert_eq!(serde_json::to_string(&data).unwrap(), r#""<p>free</p>""#);
    }

    #[test]
    fn test_start_prefers_prior_structured_then_template_then_text() {
        let markup = build_document(&scenario());

        let mut prior = ResultForm::seed(&scenario());
        prior.set_value(0, 0, "saved").unwrap();
        let form = ResultForm::start(&markup, Some(prior.clone().into_form_data()));
        assert_eq!(form, prior);

        let form = ResultForm::start(&markup, Some(ResultFormData::Legacy("old".into())));
        assert!(form.is_structured());

        let form = ResultForm::start("<p>notes</p>", Some(ResultFormData::Legacy("old".into())));
        assert_eq!(form, ResultForm::Legacy { text: "old".into() });

        let form = ResultForm::start("<p>notes</p>", None);
        assert_eq!(form, ResultForm::Legacy { text: "<p>notes</p>".into() });
    }

    #[test]
    fn test_legacy_form_rejects_field_edits() {
        let mut form = ResultForm::Legacy { text: String::new() };
        assert!(form.set_value(0, 0, "x").is_err());
        form.set_text("typed").unwrap();
        assert_eq!(form.into_form_data(), ResultFormData::Legacy("typed".into()));
    }

    #[test]
    fn test_layout_groups_pair_same_label_two_value_fields() {
        let definition = TemplateDefinition::new(vec![
            FieldDefinition::new("Electrolytes", 2),
            FieldDefinition::new("Comment", 1),
            FieldDefinition::new(" Electrolytes ", 2),
            FieldDefinition::new("Electrolytes", 3),
        ]);
        let groups = ResultForm::seed(&definition).layout_groups();
        let members: Vec<Vec<usize>> = groups.iter().map(|g| g.members.clone()).collect();
        assert_eq!(members, vec![vec![0, 2], vec![1], vec![3]]);
        assert_eq!(groups[0].label, "Electrolytes");
    }

    #[test]
    fn test_prepared_for_save_reduces_legacy_text_to_table() {
        let data = ResultFormData::Legacy("<p>x</p><table><tr><td>1</td></tr></table>".into());
        assert_eq!(
            data.prepared_for_save(),
            ResultFormData::Legacy("<table><tbody><tr><td>1</td></tr></tbody></table>".into())
        );
        let plain = ResultFormData::Legacy("<p>x</p>".into());
        assert_eq!(plain.clone().prepared_for_save(), plain);
    }
}
