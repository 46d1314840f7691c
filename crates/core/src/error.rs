#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("field index {index} out of range (template has {len} fields)")]
    FieldIndexOutOfRange { index: usize, len: usize },
    #[error("part {part} out of range (fields have at most {max} parts)")]
    PartOutOfRange { part: usize, max: usize },

    #[error("no template stored for test {0}")]
    TemplateNotFound(String),
    #[error("no result stored for {0}")]
    ResultNotFound(String),

    #[error("invalid key: {0}")]
    Key(#[from] report_types::TextError),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize result: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize result: {0}")]
    Deserialization(serde_json::Error),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
