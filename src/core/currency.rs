//! Currency abstractions and the rate source boundary

use crate::core::context::Context;
use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An opaque currency identifier such as `USD` or `EUR`.
///
/// Codes are case-significant and only ever compared for equality, so `usd`
/// and `USD` are two different currencies as far as the cache is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        CurrencyCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        CurrencyCode(code.to_string())
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        CurrencyCode(code)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered currency pair used as a cache key.
///
/// `USD:EUR` and `EUR:USD` are unrelated entries; rates are never assumed to
/// be reciprocal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RatePair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl RatePair {
    pub fn new(from: impl Into<CurrencyCode>, to: impl Into<CurrencyCode>) -> Self {
        RatePair {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Display for RatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

/// A decimal amount tagged with its currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        Money {
            amount,
            currency: currency.into(),
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// A single rate observation returned by a [`RateSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRate {
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
    /// Provider supplied date of the quote, kept for diagnostics only.
    pub as_of: Option<String>,
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the latest mid rate for `from -> to`.
    ///
    /// Implementations make exactly one attempt and must stop promptly once
    /// `ctx` is cancelled.
    async fn fetch(
        &self,
        ctx: &Context,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<FetchedRate, RateError>;
}
