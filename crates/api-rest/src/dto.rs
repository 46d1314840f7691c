//! Request and response bodies for the REST API.

use report_core::{FieldDefinition, FieldId, Parts, ResultFormData, ResultRecord, TemplateDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One template field. `id` may be omitted when creating fields; `parts` is clamped to 1..=6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_parts")]
    pub parts: i64,
}

fn default_parts() -> i64 {
    Parts::MIN as i64
}

impl From<&FieldDefinition> for FieldDto {
    fn from(field: &FieldDefinition) -> Self {
        Self {
            id: Some(field.id.to_string()),
            label: field.label.clone(),
            parts: field.parts.get() as i64,
        }
    }
}

impl From<FieldDto> for FieldDefinition {
    fn from(dto: FieldDto) -> Self {
        let id = dto
            .id
            .and_then(|id| FieldId::new(id).ok())
            .unwrap_or_else(FieldId::generate);
        FieldDefinition {
            id,
            label: dto.label,
            parts: Parts::clamped(dto.parts),
        }
    }
}

pub fn definition_from_dtos(fields: Vec<FieldDto>) -> TemplateDefinition {
    TemplateDefinition::new(fields.into_iter().map(FieldDefinition::from).collect())
}

pub fn dtos_from_definition(definition: &TemplateDefinition) -> Vec<FieldDto> {
    definition.fields().iter().map(FieldDto::from).collect()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildTemplateReq {
    pub fields: Vec<FieldDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkupRes {
    pub markup: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecodeTemplateReq {
    pub markup: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecodeTemplateRes {
    /// `null` when the markup carries no usable field definition.
    pub fields: Option<Vec<FieldDto>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateRes {
    pub test_id: String,
    pub markup: String,
    pub fields: Option<Vec<FieldDto>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeedResultReq {
    pub markup: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub prior: Option<ResultFormData>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FormDataRes {
    #[schema(value_type = Object)]
    pub form_data: ResultFormData,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenderResultReq {
    #[schema(value_type = Object)]
    pub form_data: ResultFormData,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenderResultRes {
    pub html: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveResultReq {
    #[schema(value_type = Object)]
    pub form_data: ResultFormData,
    #[serde(default)]
    pub patient_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultRecordRes {
    pub test_id: String,
    pub token: String,
    pub patient_ref: Option<String>,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    #[schema(value_type = Object)]
    pub form_data: ResultFormData,
    /// Print-ready rendering of `form_data`.
    pub html: String,
}

impl ResultRecordRes {
    pub fn new(record: ResultRecord, html: String) -> Self {
        Self {
            test_id: record.test_id.to_string(),
            token: record.token.to_string(),
            patient_ref: record.patient_ref,
            saved_at: record.saved_at.to_rfc3339(),
            form_data: record.form_data,
            html,
        }
    }
}
