//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::{
    DEFAULT_FONT_SIZE_MAX, DEFAULT_FONT_SIZE_MIN, RESULTS_DIR_NAME, TEMPLATES_DIR_NAME,
};
use crate::{ReportError, ReportResult};
use std::path::{Path, PathBuf};

/// Inclusive range of font sizes (px) the editor accepts for size runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSizeBounds {
    min: u16,
    max: u16,
}

impl FontSizeBounds {
    pub fn new(min: u16, max: u16) -> ReportResult<Self> {
        if min == 0 {
            return Err(ReportError::InvalidInput(
                "minimum font size must be at least 1px".into(),
            ));
        }
        if min > max {
            return Err(ReportError::InvalidInput(format!(
                "minimum font size {}px exceeds maximum {}px",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, px: u16) -> bool {
        (self.min..=self.max).contains(&px)
    }

    pub fn min(&self) -> u16 {
        self.min
    }

    pub fn max(&self) -> u16 {
        self.max
    }
}

impl Default for FontSizeBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_FONT_SIZE_MIN,
            max: DEFAULT_FONT_SIZE_MAX,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    font_sizes: FontSizeBounds,
}

impl CoreConfig {
    pub fn new(data_dir: PathBuf, font_sizes: FontSizeBounds) -> ReportResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ReportError::InvalidInput(
                "data_dir cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            font_sizes,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir.join(TEMPLATES_DIR_NAME)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join(RESULTS_DIR_NAME)
    }

    pub fn font_sizes(&self) -> FontSizeBounds {
        self.font_sizes
    }
}

/// Parse font-size bounds from optional string values (typically environment variables).
///
/// Missing or blank values fall back to the defaults individually.
pub fn font_size_bounds_from_env_values(
    min: Option<String>,
    max: Option<String>,
) -> ReportResult<FontSizeBounds> {
    fn parse(value: Option<String>, name: &str, default: u16) -> ReportResult<u16> {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match value {
            None => Ok(default),
            Some(v) => v.parse::<u16>().map_err(|e| {
                ReportError::InvalidInput(format!("{} must be a whole number of px: {}", name, e))
            }),
        }
    }

    let min = parse(min, "REPORT_FONT_SIZE_MIN", DEFAULT_FONT_SIZE_MIN)?;
    let max = parse(max, "REPORT_FONT_SIZE_MAX", DEFAULT_FONT_SIZE_MAX)?;
    FontSizeBounds::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_bounds_defaults_when_unset() {
        let bounds = font_size_bounds_from_env_values(None, Some("  ".into())).unwrap();
        assert_eq!(bounds, FontSizeBounds::default());
    }

    #[test]
    fn test_font_size_bounds_rejects_inverted_range() {
        let err = font_size_bounds_from_env_values(Some("40".into()), Some("12".into()))
            .expect_err("min > max must fail");
        assert!(matches!(err, ReportError::InvalidInput(msg) if msg.contains("exceeds")));
    }

    #[test]
    fn test_font_size_bounds_rejects_garbage() {
        let err = font_size_bounds_from_env_values(Some("big".into()), None).unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(msg) if msg.contains("REPORT_FONT_SIZE_MIN")));
    }

    #[test]
    fn test_core_config_derives_store_dirs() {
        let cfg = CoreConfig::new(PathBuf::from("/tmp/reports"), FontSizeBounds::default()).unwrap();
        assert_eq!(cfg.templates_dir(), PathBuf::from("/tmp/reports/templates"));
        assert_eq!(cfg.results_dir(), PathBuf::from("/tmp/reports/results"));
        assert!(CoreConfig::new(PathBuf::new(), FontSizeBounds::default()).is_err());
    }
}
