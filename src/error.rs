//! The error every engine operation returns.

use crate::core::currency::Currency;
use crate::core::rates::RateError;
use crate::core::reserve::ReserveError;
use thiserror::Error;

/// Broad category of an [`ExchangeError`], for callers that react per kind
/// (for example to pick a message or to count rejections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Validation,
    RateNotFound,
    Reserve,
}

/// Errors raised by the exchange engine.
///
/// All of them are recoverable: a failed call leaves the office exactly as
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("no exchange rate available for {from} -> {to}")]
    RateNotFound { from: Currency, to: Currency },
    #[error(transparent)]
    Reserve(#[from] ReserveError),
}

impl ExchangeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::Validation(_) => ErrorKind::Validation,
            ExchangeError::RateNotFound { .. } => ErrorKind::RateNotFound,
            ExchangeError::Reserve(_) => ErrorKind::Reserve,
        }
    }
}

impl From<RateError> for ExchangeError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::RateNotFound { from, to } => ExchangeError::RateNotFound { from, to },
            invalid @ (RateError::InvalidRate { .. } | RateError::Overflow { .. }) => {
                ExchangeError::Validation(invalid.to_string())
            }
        }
    }
}
