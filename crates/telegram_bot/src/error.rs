//! Errors raised while handling an update.
use thiserror::Error;

/// Per-request failure. Every variant is caught by the top-level handler and
/// reported back to the chat; none of them stops the bot.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Ledger(#[from] ledger::Error),
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),
}

impl BotError {
    /// Name of the error kind, as shown in the failure reply.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessDenied(_) => "AccessDenied",
            Self::Validation(_) => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Ledger(err) => err.kind(),
            Self::Request(_) => "RequestError",
        }
    }
}
