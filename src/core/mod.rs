//! Core business logic: rate caching, conversion and balance aggregation

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod currency;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod log;

// Re-export main types for cleaner imports
pub use aggregate::{BalanceAggregator, BalanceSummary, ConvertedBalance};
pub use cache::{CacheEntry, RateCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{CancelHandle, Context};
pub use currency::{CurrencyCode, FetchedRate, Money, RatePair, RateSource};
pub use engine::ConversionEngine;
pub use error::RateError;
