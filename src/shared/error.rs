//! Shared error types for the application
//!
//! One error enum per boundary; handlers map them onto HTTP statuses,
//! the ingest pipeline and the transcode scheduler convert them into
//! troubles and task failures instead of propagating.

use thiserror::Error;

/// Domain errors - validation and precondition failures
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Repository errors - errors that occur during data access
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    RepositoryError::Duplicate(db_err.message().to_string())
                } else if db_err.is_check_violation() {
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else {
                    RepositoryError::Database(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut => {
                RepositoryError::Connection("Connection pool timeout".to_string())
            }
            sqlx::Error::PoolClosed => {
                RepositoryError::Connection("Connection pool closed".to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Title searcher errors
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("API error: {0}")]
    ApiError(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl SearchError {
    /// True for transport-level faults a user may reasonably retry.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SearchError::Network(_) | SearchError::ApiError(_) | SearchError::RateLimitExceeded
        )
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            SearchError::Network("Connection failed".to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Deserialization(err.to_string())
    }
}

/// Metadata prober errors
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prober execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not a video file: {0}")]
    NotAVideo(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Transcoder runner errors
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The runner process could not be started; a retry may succeed.
    #[error("Runner startup failed: {0}")]
    Startup(String),

    /// The runner terminated with a diagnostic; the reason is the mined
    /// error message per the diagnostic contract.
    #[error("Transcode failed: {0}")]
    Failed(String),

    #[error("Cancelled")]
    Cancelled,
}

/// Filesystem errors
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Walk error: {0}")]
    WalkError(String),
}

/// Messaging/Event bus errors
#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Event bus error: {0}")]
    EventBusError(String),
}

/// Session and permission gate errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No access token presented")]
    TokenMissing,

    #[error("Token invalid")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Missing permission: {0}")]
    PermissionDenied(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required option: {0}")]
    Missing(String),
}

/// Application errors - roll-up used at the service and handler layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
