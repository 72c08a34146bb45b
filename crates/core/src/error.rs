use thiserror::Error;

pub const MODEL_NOT_LOADED_MESSAGE: &str = "Error: Question generator model not loaded.";
pub const NO_GOOD_QUESTIONS_MESSAGE: &str = "Could not generate good questions.";

#[derive(Debug, Error)]
pub enum ProposerError {
    #[error("question proposer is not available")]
    Unavailable,

    #[error("proposer request failed: {0}")]
    Request(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid proposer response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("text encoder is not available")]
    Unavailable,

    #[error("encoder request failed: {0}")]
    Request(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid encoder response: {0}")]
    InvalidResponse(String),

    #[error("encoder returned an empty or zero vector")]
    EmptyVector,

    #[error("embedding dimensions differ: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Error: Question generator model not loaded.")]
    ModelUnavailable,

    #[error("Could not generate good questions.")]
    EmptyResult,

    #[error("{0}")]
    Proposer(#[from] ProposerError),

    #[error("{0}")]
    Encoder(#[from] EncoderError),

    #[error("invalid generation options: {0}")]
    InvalidOptions(String),

    #[error("regex error: {0}")]
    Pattern(#[from] regex::Error),
}

impl GenerationError {
    /// Converts the error into the one-element message list handed to callers.
    pub fn into_messages(self) -> Vec<String> {
        let message = match self {
            GenerationError::ModelUnavailable => MODEL_NOT_LOADED_MESSAGE.to_string(),
            GenerationError::EmptyResult => NO_GOOD_QUESTIONS_MESSAGE.to_string(),
            other => format!("Error generating questions: {other}"),
        };
        vec![message]
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
