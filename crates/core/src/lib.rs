//! # Report Core
//!
//! Structured report-template engine.
//!
//! A test's report layout is authored once as a list of named fields, each split into one
//! to six input cells, and persisted as a single block of printable markup with the field
//! definition embedded in a marker comment. The same markup later yields a typed entry form,
//! and the filled form is rendered back to print-ready markup.
//!
//! - [`codec`]: embed and recover the field definition
//! - [`builder`]: field list → table markup, plus draft editing of the field list
//! - [`editor`]: interactive table editing (targeting, rows/columns, headers, splits)
//! - [`result`] and [`render`]: result entry and print rendering
//! - [`store`] and [`service`]: persistence seams and workflow orchestration
//!
//! **No API concerns**: HTTP and command-line front ends live in `api-rest` and `report-cli`.

pub mod builder;
pub mod codec;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod markup;
pub mod render;
pub mod result;
pub mod service;
pub mod store;

pub use builder::{build_document, build_document_body, TemplateDraft};
pub use codec::{FieldDefinition, TemplateDefinition};
pub use config::{CoreConfig, FontSizeBounds};
pub use editor::{
    reduce_to_first_table, EditMode, EditOutcome, EditorSurface, SplitKind, SurfacePoint,
    TextSelection,
};
pub use error::{ReportError, ReportResult};
pub use markup::Document;
pub use render::{render_fields, render_form_data};
pub use result::{LayoutGroup, ResultField, ResultForm, ResultFormData};
pub use service::{ReportService, TemplateView};
pub use store::{FsStore, ResultRecord, ResultStore, TemplateStore};

// Re-export validated value types so front ends need only one dependency.
pub use report_types::{FieldId, Parts, RecordKey, TextError};
