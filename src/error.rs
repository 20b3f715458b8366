//! Error taxonomy for the dispatch core.
//!
//! Three layers: [`PatternError`] for malformed route specifications (fatal
//! at startup), [`HttpFailure`] for failures a controller raises on purpose
//! (carry a status code and a message that is safe to show the client), and
//! [`DispatchError`] as the single type that flows out of guards and actions
//! into the failure classifier.

use serde_json::{Map, Value};
use thiserror::Error;

/// A route specification that cannot be compiled or resolved.
///
/// Registration stops at the first one of these; a server must not start
/// with a half-built routing table.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("empty route pattern")]
    Empty,
    #[error("invalid route pattern `{spec}`: {reason}")]
    Invalid { spec: String, reason: String },
    #[error("route pattern `{spec}` matches the empty path")]
    MatchesEmpty { spec: String },
    #[error("invalid route key `{key}`: {reason}")]
    Key { key: String, reason: String },
    #[error("route target `{target}` must contain a controller/action separator")]
    Target { target: String },
    #[error("placeholder `{placeholder}` does not name a capture group of `{spec}`")]
    Placeholder { spec: String, placeholder: String },
}

/// A failure raised deliberately by a guard or an action.
///
/// The message is exposed to the client when `expose` is set, which the
/// status-specific constructors do by default; anything attached through
/// [`HttpFailure::with_extra`] is merged into JSON error bodies.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpFailure {
    pub status: u16,
    pub message: String,
    pub expose: bool,
    pub extra: Option<Map<String, Value>>,
}

impl HttpFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            expose: true,
            extra: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(503, message)
    }

    /// Keep the status but hide the message from the client; the generic
    /// phrase for the status is sent instead.
    pub fn hidden(mut self) -> Self {
        self.expose = false;
        self
    }

    /// Attach an extra field carried into JSON error bodies.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

/// Anything a dispatch can fail with.
///
/// `Pattern` and `Config` are wiring mistakes: fatal where they can be
/// caught at startup, a plain 500 when they only surface at dispatch time.
/// `Io` exists so a missing filesystem entity classifies as 404. `Other` is
/// the unclassified bucket: 500, message never exposed, full detail logged.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Http(#[from] HttpFailure),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Other(err)
    }
}
