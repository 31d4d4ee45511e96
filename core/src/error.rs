use std::fmt;
use thiserror::Error;

/// The error type for every azauth operation.
///
/// An error has a [`ErrorKind`] to match on, a human readable message and an
/// optional source describing the underlying failure.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required configuration is missing or malformed. Validation failures,
    /// bad endpoints, unknown cloud names and bad tenant lists land here.
    ConfigInvalid,

    /// No authentication method is applicable to the given configuration.
    NoApplicableMethod,

    /// The environment or the signed in identity is not supported, for
    /// example a CLI account that is not a user, or App Service MSI.
    IdentityUnsupported,

    /// An external command could not be started or exited non-zero.
    CommandFailed,

    /// A command or a service answered with something we cannot parse.
    ResponseInvalid,

    /// An identity provider refused to hand out a token.
    TokenExchange,

    /// Anything else: I/O, transport, poisoned state.
    Unexpected,
}

impl Error {
    /// Create a new error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Prefix the message with `context`, keeping kind and source.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the error was caused by the caller's configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ConfigInvalid | ErrorKind::NoApplicableMethod
        )
    }
}

impl Error {
    /// Create a [`ErrorKind::ConfigInvalid`] error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a [`ErrorKind::NoApplicableMethod`] error.
    pub fn no_applicable_method(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoApplicableMethod, message)
    }

    /// Create a [`ErrorKind::IdentityUnsupported`] error.
    pub fn identity_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IdentityUnsupported, message)
    }

    /// Create a [`ErrorKind::CommandFailed`] error.
    pub fn command_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CommandFailed, message)
    }

    /// Create a [`ErrorKind::ResponseInvalid`] error.
    pub fn response_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseInvalid, message)
    }

    /// Create a [`ErrorKind::TokenExchange`] error.
    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExchange, message)
    }

    /// Create a [`ErrorKind::Unexpected`] error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::NoApplicableMethod => write!(f, "no applicable authentication method"),
            ErrorKind::IdentityUnsupported => write!(f, "unsupported identity"),
            ErrorKind::CommandFailed => write!(f, "command failed"),
            ErrorKind::ResponseInvalid => write!(f, "invalid response"),
            ErrorKind::TokenExchange => write!(f, "token exchange failed"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Result with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::unexpected(format!("building http request: {err}")).with_source(err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::unexpected(format!("invalid header value: {err}")).with_source(err)
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::config_invalid(format!("invalid uri: {err}")).with_source(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::response_invalid(err.to_string()).with_source(err)
    }
}
