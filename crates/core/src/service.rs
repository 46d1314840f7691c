//! Report workflow orchestration.
//!
//! [`ReportService`] ties the engine to its stores: authoring a template for a test, opening
//! it in the editor, starting result entry from the stored template plus any saved result,
//! and saving and rendering results. Front ends (CLI, REST) talk to this service rather than
//! to the stores directly.

use crate::builder::build_document;
use crate::codec::{self, TemplateDefinition};
use crate::config::CoreConfig;
use crate::editor::{EditMode, EditorSurface};
use crate::render::render_form_data;
use crate::result::{ResultForm, ResultFormData};
use crate::store::{FsStore, ResultRecord, ResultStore, TemplateStore};
use crate::{ReportError, ReportResult};
use chrono::Utc;
use report_types::RecordKey;
use std::sync::Arc;

/// Stored template markup with its decoded definition, if it has one.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateView {
    pub markup: String,
    pub definition: Option<TemplateDefinition>,
}

#[derive(Clone)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
    templates: Arc<dyn TemplateStore>,
    results: Arc<dyn ResultStore>,
}

impl ReportService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        templates: Arc<dyn TemplateStore>,
        results: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            cfg,
            templates,
            results,
        }
    }

    /// Service backed by a single [`FsStore`] under the configured data directory.
    pub fn with_fs_store(cfg: Arc<CoreConfig>) -> Self {
        let store = Arc::new(FsStore::new(cfg.clone()));
        Self::new(cfg, store.clone(), store)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Builds markup for `definition` and stores it as the template for `test_id`.
    pub fn build_template(
        &self,
        test_id: &RecordKey,
        definition: &TemplateDefinition,
    ) -> ReportResult<String> {
        let markup = build_document(definition);
        self.templates.save_template(test_id, &markup)?;
        Ok(markup)
    }

    pub fn template(&self, test_id: &RecordKey) -> ReportResult<TemplateView> {
        let markup = self.templates.load_template(test_id)?;
        let definition = codec::decode(&markup);
        Ok(TemplateView { markup, definition })
    }

    /// Keys of every stored template.
    pub fn list_templates(&self) -> ReportResult<Vec<RecordKey>> {
        self.templates.list_templates()
    }

    /// Opens the stored template for editing with the configured font-size bounds.
    pub fn open_editor(&self, test_id: &RecordKey, mode: EditMode) -> ReportResult<EditorSurface> {
        let markup = self.templates.load_template(test_id)?;
        Ok(EditorSurface::open(&markup, mode).with_font_sizes(self.cfg.font_sizes()))
    }

    /// Persists the editor's current markup as the template for `test_id`.
    pub fn save_editor(&self, test_id: &RecordKey, surface: &EditorSurface) -> ReportResult<()> {
        self.templates.save_template(test_id, &surface.markup())
    }

    /// Starts result entry for `test_id` on `token`.
    ///
    /// A previously saved result is restored if it is structured; otherwise the form is
    /// derived from the stored template.
    pub fn start_result(&self, test_id: &RecordKey, token: &RecordKey) -> ReportResult<ResultForm> {
        let prior = match self.results.load_result(test_id, token) {
            Ok(record) => Some(record.form_data),
            Err(ReportError::ResultNotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let markup = match self.templates.load_template(test_id) {
            Ok(markup) => markup,
            Err(ReportError::TemplateNotFound(_)) if prior.is_some() => String::new(),
            Err(e) => return Err(e),
        };
        Ok(ResultForm::start(&markup, prior))
    }

    /// Saves a filled-in form. Legacy text is normalised before it is written.
    pub fn save_result(
        &self,
        test_id: &RecordKey,
        token: &RecordKey,
        form_data: ResultFormData,
        patient_ref: Option<String>,
    ) -> ReportResult<ResultRecord> {
        let record = ResultRecord {
            test_id: test_id.clone(),
            token: token.clone(),
            patient_ref,
            saved_at: Utc::now(),
            form_data: form_data.prepared_for_save(),
        };
        self.results.save_result(&record)?;
        Ok(record)
    }

    pub fn load_result(&self, test_id: &RecordKey, token: &RecordKey) -> ReportResult<ResultRecord> {
        self.results.load_result(test_id, token)
    }

    pub fn list_results(&self, test_id: &RecordKey) -> ReportResult<Vec<ResultRecord>> {
        self.results.list_results(test_id)
    }

    /// Print-ready markup for a saved result.
    pub fn render_result(&self, test_id: &RecordKey, token: &RecordKey) -> ReportResult<String> {
        let record = self.results.load_result(test_id, token)?;
        Ok(render_form_data(&record.form_data))
    }
}
