//! The module contains the errors the ledger can throw.
//!
//! Every variant maps to a stable kind name (see [`Error::kind`]) that the
//! bot shows to the user when a request fails:
//!
//! - [`Validation`] bad input, capacity exceeded, date out of range.
//! - [`Configuration`] unknown backend, missing credentials.
//! - [`DataIntegrity`] a spreadsheet row that cannot be decoded.
//! - [`NotFound`] a sheet or template that does not exist.
//!
//!  [`Validation`]: Error::Validation
//!  [`Configuration`]: Error::Configuration
//!  [`DataIntegrity`]: Error::DataIntegrity
//!  [`NotFound`]: Error::NotFound
use reqwest::StatusCode;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    DataIntegrity(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Name of the error kind, as reported back to the chat.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
            Self::DataIntegrity(_) => "DataIntegrityError",
            Self::NotFound(_) => "NotFoundError",
            Self::Api { .. } => "ApiError",
            Self::Network(_) => "NetworkError",
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::DataIntegrity(a), Self::DataIntegrity(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (
                Self::Api {
                    status: a,
                    message: m,
                },
                Self::Api {
                    status: b,
                    message: n,
                },
            ) => a == b && m == n,
            (Self::Network(a), Self::Network(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
