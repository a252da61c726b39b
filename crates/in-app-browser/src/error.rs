use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JavaScript evaluation failed: {0}")]
    ScriptEvaluation(String),

    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    #[error("Web view {0} has been disposed")]
    Disposed(i64),

    #[error("No handler registered on channel {0}")]
    NoHandler(String),

    #[error("View id {0} is already in use")]
    DuplicateViewId(i64),

    #[error("Unknown view type: {0}")]
    UnknownViewType(String),

    #[error("Web view backend initialization failed")]
    InitFailed,

    #[error("Failed to create web view")]
    WebViewCreationFailed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable code sent in error replies over the channel.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MISSING_PARAMS",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::ScriptEvaluation(_) => "JS_EVALUATION_ERROR",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::Disposed(_) => "DISPOSED",
            Self::NoHandler(_) => "NO_HANDLER",
            Self::DuplicateViewId(_) => "DUPLICATE_VIEW_ID",
            Self::UnknownViewType(_) => "UNKNOWN_VIEW_TYPE",
            Self::InitFailed => "INIT_FAILED",
            Self::WebViewCreationFailed => "CREATION_FAILED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
