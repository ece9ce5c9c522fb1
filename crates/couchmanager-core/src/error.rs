use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T, E = CouchError> = std::result::Result<T, E>;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    RequestFailed,
    ServerUnreachable,
}

#[derive(Debug, Error)]
pub enum CouchError {
    #[error("The server is not reachable.")]
    ServerUnreachable,

    #[error("CouchDB error ({status}): {error} - {reason}")]
    Api {
        status: StatusCode,
        error: String,
        reason: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse CouchDB response: {source} - body: {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },

    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unrecognised server version '{0}'")]
    InvalidVersion(String),

    #[error("{context}. Error: {source}")]
    Context {
        context: String,
        source: Box<CouchError>,
    },
}

/// CouchDB's error body: `{"error": "not_found", "reason": "missing"}`.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

impl CouchError {
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => CouchError::Api {
                status,
                error: parsed.error,
                reason: parsed.reason,
            },
            Err(_) => CouchError::Api {
                status,
                error: status.canonical_reason().unwrap_or("unknown").to_string(),
                reason: body.to_string(),
            },
        }
    }

    /// Wraps the error with a human-readable message, keeping it as the source.
    pub fn context(self, context: impl Into<String>) -> Self {
        CouchError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CouchError::ServerUnreachable => ErrorKind::ServerUnreachable,
            CouchError::Api { status, .. } if *status == StatusCode::NOT_FOUND => ErrorKind::NotFound,
            CouchError::Transport(e) if e.is_connect() => ErrorKind::ServerUnreachable,
            CouchError::Context { source, .. } => source.kind(),
            _ => ErrorKind::RequestFailed,
        }
    }

    /// The innermost error, past every context layer.
    pub fn root(&self) -> &CouchError {
        match self {
            CouchError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self.root() {
            CouchError::Api { status, .. } => Some(*status),
            CouchError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The server-supplied `reason`, if the failure came from an error response.
    pub fn reason(&self) -> Option<&str> {
        match self.root() {
            CouchError::Api { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// True when the server reported the target as `missing`. A deleted
    /// document reports `deleted` instead and does not count.
    pub fn is_missing(&self) -> bool {
        self.reason() == Some("missing")
    }
}
