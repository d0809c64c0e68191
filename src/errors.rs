//! Error types for the API client.
//!
//! Two layers:
//! - `TransportError` - the HTTP exchange itself failed (connection, status,
//!    empty body). Never retried.
//! - `ApiError` - everything a caller of `MediaWikiApi` can see. Wraps
//!    transport failures and adds the response-shape failures (missing user,
//!    missing object, unexpected document).
//!
//! Both implement `std::error::Error`, `Debug`, and `Display`.

use std::error::Error;
use std::fmt;

/// The canonical result type used across the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure of a single request/response exchange.
#[derive(Debug)]
pub enum TransportError {
    /// The request could not be sent, or middleware rejected it.
    Request(reqwest_middleware::Error),
    /// The response body could not be read.
    Body(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: u16, url: String },
    /// The server answered with nothing.
    EmptyBody { url: String },
    /// The HTTP client could not be constructed.
    Client(reqwest::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(e) => write!(f, "Request failed: {}", e),
            TransportError::Body(e) => write!(f, "Failed to read response body: {}", e),
            TransportError::Status { status, url } => {
                write!(f, "Server returned HTTP {} for {}", status, url)
            }
            TransportError::EmptyBody { url } => write!(f, "Empty response body from {}", url),
            TransportError::Client(e) => write!(f, "Failed to build HTTP client: {}", e),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Request(e) => Some(e),
            TransportError::Body(e) | TransportError::Client(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest_middleware::Error> for TransportError {
    fn from(value: reqwest_middleware::Error) -> Self {
        Self::Request(value)
    }
}
impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self::Body(value)
    }
}

/// Everything that can go wrong in an API operation.
///
/// `MissingUser` is the user-scoped flavour of `MissingObject`; use
/// [`ApiError::is_missing_object`] to match both.
#[derive(Debug)]
pub enum ApiError {
    MissingObject {
        what: String,
    },
    MissingUser {
        user: String,
    },
    General {
        msg: String,
        /// Raw response body, kept for diagnostics when the shape was wrong.
        raw: Option<String>,
    },
    Transport(TransportError),
    Xml {
        msg: String,
    },
    PageLimitExceeded {
        limit: usize,
    },
}

impl ApiError {
    /// Construct a general API error with a message.
    pub fn general<S: Into<String>>(msg: S) -> Self {
        ApiError::General {
            msg: msg.into(),
            raw: None,
        }
    }

    /// Construct a general API error carrying the raw response.
    pub fn general_with_raw<S: Into<String>, R: Into<String>>(msg: S, raw: R) -> Self {
        ApiError::General {
            msg: msg.into(),
            raw: Some(raw.into()),
        }
    }

    pub fn missing_object<S: Into<String>>(what: S) -> Self {
        ApiError::MissingObject { what: what.into() }
    }

    pub fn missing_user<S: Into<String>>(user: S) -> Self {
        ApiError::MissingUser { user: user.into() }
    }

    pub fn xml<S: Into<String>>(msg: S) -> Self {
        ApiError::Xml { msg: msg.into() }
    }

    /// True for both `MissingObject` and `MissingUser`.
    pub fn is_missing_object(&self) -> bool {
        matches!(
            self,
            ApiError::MissingObject { .. } | ApiError::MissingUser { .. }
        )
    }

    /// The raw response attached to a general error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ApiError::General { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }

    /// Returns a short, user-friendly description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingObject { .. } => "MissingObject",
            ApiError::MissingUser { .. } => "MissingUser",
            ApiError::General { .. } => "General",
            ApiError::Transport(_) => "Transport",
            ApiError::Xml { .. } => "Xml",
            ApiError::PageLimitExceeded { .. } => "PageLimitExceeded",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingObject { what } => write!(f, "Object not found: {}", what),
            ApiError::MissingUser { user } => write!(f, "Missing user: {}", user),
            ApiError::General { msg, .. } => write!(f, "{}", msg),
            ApiError::Transport(e) => write!(f, "Transport error: {}", e),
            ApiError::Xml { msg } => write!(f, "Malformed response: {}", msg),
            ApiError::PageLimitExceeded { limit } => write!(
                f,
                "Continuation did not finish within {} pages",
                limit
            ),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<xml::reader::Error> for ApiError {
    fn from(value: xml::reader::Error) -> Self {
        Self::xml(value.to_string())
    }
}
