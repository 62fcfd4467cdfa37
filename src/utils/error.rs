use thiserror::Error;

#[derive(Error, Debug)]
pub enum RobotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Script parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Script error: {message}")]
    ScriptError { message: String },
}

pub type Result<T> = std::result::Result<T, RobotError>;
