use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Could not detect reporting month and year from file name: {0}")]
    PeriodNotDetected(String),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("No configuration available for year {0} or any earlier year")]
    ConfigNotFound(i32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
