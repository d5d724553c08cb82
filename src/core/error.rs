//! Errors raised by the rate source and everything layered on it.

use crate::core::currency::RatePair;
use thiserror::Error;

/// Failure of a rate lookup or conversion.
///
/// Every variant is terminal for the call that produced it; nothing in this
/// crate retries. `Upstream` keeps the raw response body for diagnostics but
/// leaves it out of `Display` so it never reaches end users.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("network error fetching rate for {pair}: {message}")]
    Network { pair: RatePair, message: String },

    #[error("rate source returned status {status} for {pair}")]
    Upstream {
        pair: RatePair,
        status: u16,
        body: String,
    },

    #[error("failed to decode rate response for {pair}: {message}")]
    Decode { pair: RatePair, message: String },

    #[error("rate request for {pair} cancelled")]
    Cancelled { pair: RatePair },

    #[error("amount out of range converting {pair}")]
    Overflow { pair: RatePair },
}

impl RateError {
    /// The pair the failing call was about, if it got far enough to have one.
    pub fn pair(&self) -> Option<&RatePair> {
        match self {
            RateError::InvalidInput(_) => None,
            RateError::Network { pair, .. }
            | RateError::Upstream { pair, .. }
            | RateError::Decode { pair, .. }
            | RateError::Cancelled { pair }
            | RateError::Overflow { pair } => Some(pair),
        }
    }
}
