use thiserror::Error;

/// Failures while loading, mutating, or persisting a notebook.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed notebook: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cell index {0} out of range")]
    CellOutOfRange(usize),

    #[error("cell {0} is not a reasoning cell")]
    NotReasoningCell(usize),
}

/// Failures while deriving an action trace from a notebook.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no instruction cell precedes the action sequence")]
    NoInstruction,

    #[error("no tool actions between instruction and reasoning")]
    EmptyTrace,

    #[error("no reasoning cell follows the action sequence")]
    NoReasoningCell,
}

/// Failures from the outbound text-generation call. One variant per
/// failure class so the driver can report what actually went wrong.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("authentication rejected by the generation service")]
    Auth,

    #[error("generation service rate limit hit")]
    RateLimited,

    #[error("generation request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response from generation service: {0}")]
    MalformedResponse(String),

    #[error("generation service returned an empty completion")]
    EmptyResponse,
}

/// Failures while splicing generated text back into a notebook.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("generated text failed the sanity check: {0}")]
    Declined(&'static str),

    #[error(transparent)]
    Document(#[from] DocumentError),
}
