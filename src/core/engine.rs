//! Rate lookup and amount conversion on top of the cache and a rate source.

use crate::core::cache::RateCache;
use crate::core::context::Context;
use crate::core::currency::{CurrencyCode, Money, RatePair, RateSource};
use crate::core::error::RateError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Decimal places kept on converted amounts.
pub const AMOUNT_SCALE: u32 = 2;

pub struct ConversionEngine {
    source: Arc<dyn RateSource>,
    cache: Arc<RateCache>,
}

impl ConversionEngine {
    pub fn new(source: Arc<dyn RateSource>, cache: Arc<RateCache>) -> Self {
        ConversionEngine { source, cache }
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Returns the rate for `from -> to`, fetching and caching it on a miss.
    ///
    /// Identical currencies are not special-cased: `USD -> USD` goes through
    /// the cache and the source like any other pair. Concurrent misses for
    /// the same pair may each fetch; the last store wins.
    pub async fn get_rate(
        &self,
        ctx: &Context,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, RateError> {
        let pair = RatePair::new(from.clone(), to.clone());
        if let Some(entry) = self.cache.lookup(&pair) {
            return Ok(entry.rate);
        }

        let fetched = self.source.fetch(ctx, from, to).await?;
        let entry = self.cache.store(pair, fetched.rate, fetched.fetched_at);
        info!(
            from = %from,
            to = %to,
            rate = %entry.rate,
            expires_at = %entry.expires_at,
            "Exchange rate fetched and cached"
        );
        Ok(entry.rate)
    }

    /// Converts `amount` and rounds the result to two decimals, half away from zero.
    pub async fn convert(
        &self,
        ctx: &Context,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, RateError> {
        debug!(%amount, %from, %to, "Converting amount");

        let rate = self.get_rate(ctx, from, to).await.inspect_err(|e| {
            error!(%amount, %from, %to, error = %e, "Failed to get exchange rate for conversion");
        })?;

        let converted = amount.checked_mul(rate).map(round_amount).ok_or_else(|| {
            error!(%amount, %from, %to, %rate, "Converted amount out of range");
            RateError::Overflow {
                pair: RatePair::new(from.clone(), to.clone()),
            }
        })?;
        debug!(%amount, %from, %to, %rate, %converted, "Amount converted");
        Ok(converted)
    }

    pub async fn convert_amount(
        &self,
        ctx: &Context,
        money: &Money,
        to: &CurrencyCode,
    ) -> Result<Money, RateError> {
        let amount = self
            .convert(ctx, money.amount, &money.currency, to)
            .await?;
        Ok(Money::new(amount, to.clone()))
    }

    pub fn clear_cache(&self) {
        info!("Clearing all cached exchange rates");
        self.cache.clear();
    }

    pub fn clear_cache_for_pair(&self, from: &CurrencyCode, to: &CurrencyCode) {
        let pair = RatePair::new(from.clone(), to.clone());
        self.cache.invalidate(&pair);
        info!(pair = %pair, "Cache cleared for currency pair");
    }
}

pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
