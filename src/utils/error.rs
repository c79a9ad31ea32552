use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Commission bracket lookup failed: {message}")]
    ResolverError { message: String },

    #[error("Settings lookup failed: {message}")]
    SettingsError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl EngineError {
    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            EngineError::HttpError(_) => "Could not reach a remote service".to_string(),
            EngineError::CsvError(_) => "The cost CSV file could not be read".to_string(),
            EngineError::IoError(e) => format!("File access failed: {}", e),
            EngineError::SerializationError(_) => "Malformed JSON data".to_string(),
            EngineError::ConfigValidationError { field, .. }
            | EngineError::InvalidConfigValueError { field, .. }
            | EngineError::MissingConfigError { field } => {
                format!("Configuration problem with '{}'", field)
            }
            EngineError::ResolverError { .. } => {
                "Commission brackets are unavailable".to_string()
            }
            EngineError::SettingsError { .. } => "Global settings are unavailable".to_string(),
            EngineError::ValidationError { message } => message.clone(),
        }
    }

    /// 建議的修復方式
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EngineError::HttpError(_) | EngineError::ResolverError { .. } => {
                "Check the resolver endpoint and network connectivity"
            }
            EngineError::SettingsError { .. } => "Check the settings endpoint or [settings.values]",
            EngineError::CsvError(_) => {
                "Expected columns: concept,amount,applies_vat,applies_withholding"
            }
            EngineError::IoError(_) => "Make sure the file exists and is readable",
            EngineError::SerializationError(_) => "Verify the remote service returns JSON",
            EngineError::ConfigValidationError { .. }
            | EngineError::InvalidConfigValueError { .. }
            | EngineError::MissingConfigError { .. } => {
                "Fix the configuration file and run again"
            }
            EngineError::ValidationError { .. } => "Correct the offending input value",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
