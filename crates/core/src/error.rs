//! Error types for the Docent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Docent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Quiz errors ---
    #[error("Quiz format error: {0}")]
    QuizFormat(#[from] QuizFormatError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport-level failures talking to an LLM provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A single-shot generation call did not produce usable text.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("backend failure: {0}")]
    Backend(#[from] ProviderError),

    #[error("backend did not answer within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("backend returned an empty completion")]
    EmptyResponse,
}

/// The retrieval index could not serve a query.
///
/// Never used to signal "no matches"; an empty passage set is a valid result.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Structured quiz output could not be parsed or failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizFormatError {
    #[error("response is not a quiz array: {0}")]
    Unparseable(String),

    #[error("expected {expected} questions, got {found}")]
    QuestionCount { expected: usize, found: usize },

    #[error("question {index}: expected {expected} options, got {found}")]
    OptionCount {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("question {index}: option '{option}' appears more than once")]
    DuplicateOption { index: usize, option: String },

    #[error("question {index}: answer '{answer}' is not one of the options")]
    AnswerNotInOptions { index: usize, answer: String },

    #[error("question {index}: empty question text")]
    EmptyQuestion { index: usize },
}
