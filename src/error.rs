use thiserror::Error;

/// Errors produced by the roster optimization engine.
///
/// Every public entry point (`optimize`, `optimize_in_session`, session
/// navigation) returns `Result<_, Error>` — nothing in this crate panics
/// on bad input or an infeasible solve; panics are reserved for genuine
/// invariant violations and are caught at the outermost entry point and
/// converted into `Error::Internal`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("failed to build optimization model: {0}")]
    ModelBuild(String),

    #[error("solver returned {status}: {detail}")]
    Solver { status: String, detail: String },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("run not found in session {session_id}: {run_id}")]
    RunNotFound { session_id: String, run_id: u64 },

    #[error("data source failed: {0}")]
    DataSource(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
