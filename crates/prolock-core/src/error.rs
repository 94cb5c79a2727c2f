use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Domain value errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
