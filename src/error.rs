use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coarse failure reason reported by the service in the `error` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    InvalidArgument,
    InsufficientScope,
    NotFound,
    ResourceExhausted,
    Internal,
}

impl ErrorReason {
    /// Wire name of the reason, e.g. `NOT_FOUND`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::InvalidArgument => "INVALID_ARGUMENT",
            ErrorReason::InsufficientScope => "INSUFFICIENT_SCOPE",
            ErrorReason::NotFound => "NOT_FOUND",
            ErrorReason::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorReason::Internal => "INTERNAL",
        }
    }
}

impl FromStr for ErrorReason {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "INVALID_ARGUMENT" => Ok(ErrorReason::InvalidArgument),
            "INSUFFICIENT_SCOPE" => Ok(ErrorReason::InsufficientScope),
            "NOT_FOUND" => Ok(ErrorReason::NotFound),
            "RESOURCE_EXHAUSTED" => Ok(ErrorReason::ResourceExhausted),
            "INTERNAL" => Ok(ErrorReason::Internal),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! detail_codes {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Wire name of the code, as sent in `datastoreErrorCode`
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

detail_codes!(
    /// Fine-grained codes refining `INVALID_ARGUMENT`
    InvalidArgumentCode {
        ContentLengthRequired,
        InvalidUniverseId,
        InvalidCursor,
        InvalidVersionId,
        ExistingValueNotNumeric,
        IncrementValueTooLarge,
        IncrementValueTooSmall,
        InvalidDataStoreScope,
        InvalidEntryKey,
        InvalidDataStoreName,
        InvalidStartTime,
        InvalidEndTime,
        InvalidAttributes,
        InvalidUserIds,
        ContentMd5Required,
        InvalidLimit,
        ExclusiveCreateAndMatchVersionCannotBeSet,
        ContentTooBig,
        ChecksumMismatch,
        ContentNotJson,
        InvalidSortOrder,
    }
);

detail_codes!(
    /// Fine-grained codes refining `INSUFFICIENT_SCOPE`
    InsufficientScopeCode { Forbidden, InsufficientScope }
);

detail_codes!(
    /// Fine-grained codes refining `NOT_FOUND`
    NotFoundCode { DatastoreNotFound, EntryNotFound, VersionNotFound }
);

detail_codes!(
    /// Fine-grained codes refining `RESOURCE_EXHAUSTED`
    ResourceExhaustedCode { TooManyRequests }
);

detail_codes!(
    /// Fine-grained codes refining `INTERNAL`
    InternalCode { Unknown }
);

/// Coarse reason paired with the fine-grained code that is valid for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStoreReason {
    InvalidArgument(InvalidArgumentCode),
    InsufficientScope(InsufficientScopeCode),
    NotFound(NotFoundCode),
    ResourceExhausted(ResourceExhaustedCode),
    Internal(InternalCode),
    /// A pair the service sent that is not part of the known taxonomy
    Unrecognized { error: String, detail: String },
}

impl DataStoreReason {
    /// Build a reason from the `error` field and the first `datastoreErrorCode`
    pub fn parse(error: &str, detail: &str) -> Self {
        let parsed = match error.parse::<ErrorReason>() {
            Ok(ErrorReason::InvalidArgument) => detail.parse().ok().map(DataStoreReason::InvalidArgument),
            Ok(ErrorReason::InsufficientScope) => {
                detail.parse().ok().map(DataStoreReason::InsufficientScope)
            }
            Ok(ErrorReason::NotFound) => detail.parse().ok().map(DataStoreReason::NotFound),
            Ok(ErrorReason::ResourceExhausted) => {
                detail.parse().ok().map(DataStoreReason::ResourceExhausted)
            }
            Ok(ErrorReason::Internal) => detail.parse().ok().map(DataStoreReason::Internal),
            Err(()) => None,
        };

        parsed.unwrap_or_else(|| DataStoreReason::Unrecognized {
            error: error.to_string(),
            detail: detail.to_string(),
        })
    }

    /// Coarse reason, if the service sent a known one
    pub fn reason(&self) -> Option<ErrorReason> {
        match self {
            DataStoreReason::InvalidArgument(_) => Some(ErrorReason::InvalidArgument),
            DataStoreReason::InsufficientScope(_) => Some(ErrorReason::InsufficientScope),
            DataStoreReason::NotFound(_) => Some(ErrorReason::NotFound),
            DataStoreReason::ResourceExhausted(_) => Some(ErrorReason::ResourceExhausted),
            DataStoreReason::Internal(_) => Some(ErrorReason::Internal),
            DataStoreReason::Unrecognized { error, .. } => error.parse().ok(),
        }
    }

    /// Fine-grained code as sent on the wire
    pub fn detail(&self) -> &str {
        match self {
            DataStoreReason::InvalidArgument(code) => code.as_str(),
            DataStoreReason::InsufficientScope(code) => code.as_str(),
            DataStoreReason::NotFound(code) => code.as_str(),
            DataStoreReason::ResourceExhausted(code) => code.as_str(),
            DataStoreReason::Internal(code) => code.as_str(),
            DataStoreReason::Unrecognized { detail, .. } => detail,
        }
    }
}

impl fmt::Display for DataStoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStoreReason::Unrecognized { error, detail } => write!(f, "{}/{}", error, detail),
            other => match other.reason() {
                Some(reason) => write!(f, "{}/{}", reason, other.detail()),
                None => f.write_str(other.detail()),
            },
        }
    }
}

/// Why a failure response body could not be turned into a typed error
#[derive(Debug, Error)]
pub enum ErrorBodyKind {
    #[error("errorDetails is empty or absent")]
    MissingErrorDetails,

    #[error("malformed error body: {0}")]
    Malformed(String),
}

/// Main error type for Open Cloud operations
#[derive(Debug, Error)]
pub enum Error {
    /// Failure reported by a data store endpoint, with its full taxonomy
    #[error("data store error ({reason}): {message}")]
    DataStore {
        message: String,
        status: u16,
        reason: DataStoreReason,
    },

    /// Failure reported by an endpoint that carries no taxonomy
    #[error("open cloud error: {message}")]
    OpenCloud { message: String, status: u16 },

    /// Failure response whose body could not be decoded
    #[error("undecodable error response (HTTP {status}): {kind}")]
    ErrorBody { status: u16, kind: ErrorBodyKind },

    /// Network-level failure; no response was received
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request building error
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

impl Error {
    /// The fixed error data store endpoints raise on 502
    pub fn bad_gateway() -> Self {
        Error::DataStore {
            message: "Bad Gateway".to_string(),
            status: 502,
            reason: DataStoreReason::Internal(InternalCode::Unknown),
        }
    }

    /// Check if the service itself reported this failure
    pub fn is_service_error(&self) -> bool {
        matches!(self, Error::DataStore { .. } | Error::OpenCloud { .. })
    }

    /// Coarse reason of a data store error
    pub fn reason(&self) -> Option<ErrorReason> {
        match self {
            Error::DataStore { reason, .. } => reason.reason(),
            _ => None,
        }
    }

    /// Fine-grained code of a data store error
    pub fn fine_reason(&self) -> Option<&str> {
        match self {
            Error::DataStore { reason, .. } => Some(reason.detail()),
            _ => None,
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        self.reason() == Some(ErrorReason::NotFound)
    }

    /// Check if the service rejected the request for rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.reason() == Some(ErrorReason::ResourceExhausted)
    }

    /// Get the HTTP status code when the error carries one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::DataStore { status, .. }
            | Error::OpenCloud { status, .. }
            | Error::ErrorBody { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for Open Cloud operations
pub type Result<T> = std::result::Result<T, Error>;
