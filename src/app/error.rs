use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZeitgeistError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error message reported by the Zeitgeist server.
    #[error("{0}")]
    Api(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid tag expression: {0:?}")]
    InvalidTagExpression(String),

    #[error("Item not found: {0}")]
    ItemNotFound(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Item worker is not running")]
    WorkerClosed,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ZeitgeistError>;
