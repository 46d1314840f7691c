//! Template and result persistence.
//!
//! The engine only needs two collaborators: somewhere to fetch and save template markup per
//! test, and somewhere to fetch and save filled-in results. Both are traits so front ends can
//! plug in their own storage; [`FsStore`] is the file-backed implementation used by the CLI
//! and the REST service.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   templates/
//!     <test_id>.html
//!   results/
//!     <test_id>/
//!       <token>.json
//! ```
//!
//! Keys are [`RecordKey`]s, so they are always safe to use as path components.

use crate::config::CoreConfig;
use crate::constants::{RESULT_FILE_EXTENSION, TEMPLATE_FILE_EXTENSION};
use crate::result::ResultFormData;
use crate::{ReportError, ReportResult};
use chrono::{DateTime, Utc};
use report_types::RecordKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// A saved result for one test on one order token.
///
/// `patient_ref` and `saved_at` are carried for the caller and not interpreted here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_id: RecordKey,
    pub token: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_ref: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub form_data: ResultFormData,
}

pub trait TemplateStore: Send + Sync {
    /// Fetches the current template markup for `test_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TemplateNotFound`] if nothing is stored under `test_id`, or
    /// [`ReportError::FileRead`] if the stored markup cannot be read.
    fn load_template(&self, test_id: &RecordKey) -> ReportResult<String>;

    /// Replaces the template markup for `test_id`.
    fn save_template(&self, test_id: &RecordKey, markup: &str) -> ReportResult<()>;

    /// Keys of all stored templates, sorted.
    fn list_templates(&self) -> ReportResult<Vec<RecordKey>>;
}

pub trait ResultStore: Send + Sync {
    /// Fetches the result saved for `test_id` on `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ResultNotFound`] if no result has been saved,
    /// [`ReportError::FileRead`] or [`ReportError::Deserialization`] if it cannot be read back.
    fn load_result(&self, test_id: &RecordKey, token: &RecordKey) -> ReportResult<ResultRecord>;

    /// Saves (or overwrites) a result record.
    fn save_result(&self, record: &ResultRecord) -> ReportResult<()>;

    /// All results saved for `test_id`. Unreadable records are logged and skipped.
    fn list_results(&self, test_id: &RecordKey) -> ReportResult<Vec<ResultRecord>>;
}

/// File-backed template and result store.
#[derive(Clone, Debug)]
pub struct FsStore {
    cfg: Arc<CoreConfig>,
}

impl FsStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn template_path(&self, test_id: &RecordKey) -> PathBuf {
        self.cfg
            .templates_dir()
            .join(format!("{}.{}", test_id, TEMPLATE_FILE_EXTENSION))
    }

    fn results_dir(&self, test_id: &RecordKey) -> PathBuf {
        self.cfg.results_dir().join(test_id.as_str())
    }

    fn result_path(&self, test_id: &RecordKey, token: &RecordKey) -> PathBuf {
        self.results_dir(test_id)
            .join(format!("{}.{}", token, RESULT_FILE_EXTENSION))
    }
}

impl TemplateStore for FsStore {
    fn load_template(&self, test_id: &RecordKey) -> ReportResult<String> {
        match fs::read_to_string(self.template_path(test_id)) {
            Ok(markup) => Ok(markup),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ReportError::TemplateNotFound(test_id.to_string()))
            }
            Err(e) => Err(ReportError::FileRead(e)),
        }
    }

    fn save_template(&self, test_id: &RecordKey, markup: &str) -> ReportResult<()> {
        let dir = self.cfg.templates_dir();
        fs::create_dir_all(&dir).map_err(ReportError::StorageDirCreation)?;
        fs::write(self.template_path(test_id), markup).map_err(ReportError::FileWrite)?;
        tracing::info!("saved template for test {}", test_id);
        Ok(())
    }

    fn list_templates(&self) -> ReportResult<Vec<RecordKey>> {
        let entries = match fs::read_dir(self.cfg.templates_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReportError::FileRead(e)),
        };

        let mut keys = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match RecordKey::parse(stem) {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!("skipping template file {}: {}", path.display(), e),
            }
        }
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(keys)
    }
}

impl ResultStore for FsStore {
    fn load_result(&self, test_id: &RecordKey, token: &RecordKey) -> ReportResult<ResultRecord> {
        let contents = match fs::read_to_string(self.result_path(test_id, token)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReportError::ResultNotFound(format!("{}/{}", test_id, token)));
            }
            Err(e) => return Err(ReportError::FileRead(e)),
        };
        serde_json::from_str(&contents).map_err(ReportError::Deserialization)
    }

    fn save_result(&self, record: &ResultRecord) -> ReportResult<()> {
        let dir = self.results_dir(&record.test_id);
        fs::create_dir_all(&dir).map_err(ReportError::StorageDirCreation)?;
        let json = serde_json::to_string_pretty(record).map_err(ReportError::Serialization)?;
        fs::write(self.result_path(&record.test_id, &record.token), json)
            .map_err(ReportError::FileWrite)?;
        tracing::info!("saved result for test {} token {}", record.test_id, record.token);
        Ok(())
    }

    fn list_results(&self, test_id: &RecordKey) -> ReportResult<Vec<ResultRecord>> {
        let entries = match fs::read_dir(self.results_dir(test_id)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReportError::FileRead(e)),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RESULT_FILE_EXTENSION) {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<ResultRecord>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("failed to read result {} - {}", path.display(), e),
            }
        }
        records.sort_by(|a, b| a.token.as_str().cmp(b.token.as_str()));
        Ok(records)
    }
}
