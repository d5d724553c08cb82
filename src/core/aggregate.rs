//! Folds per-currency balances into a single reporting total.

use crate::core::context::Context;
use crate::core::currency::{CurrencyCode, RatePair};
use crate::core::engine::ConversionEngine;
use crate::core::error::RateError;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One currency's balance and its value in the target currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedBalance {
    pub currency: CurrencyCode,
    pub balance: Decimal,
    pub converted: Decimal,
}

/// Result of aggregating balances into `target_currency`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub target_currency: CurrencyCode,
    pub lines: Vec<ConvertedBalance>,
    pub total: Decimal,
}

pub struct BalanceAggregator {
    engine: Arc<ConversionEngine>,
}

impl BalanceAggregator {
    pub fn new(engine: Arc<ConversionEngine>) -> Self {
        BalanceAggregator { engine }
    }

    /// Converts every balance to `target` and sums the results.
    ///
    /// Each term is rounded to two decimals by the engine before it is added,
    /// so the total is a sum of rounded amounts. The first failed conversion
    /// aborts the whole aggregation; there is no partial total.
    pub async fn aggregate(
        &self,
        ctx: &Context,
        balances: &BTreeMap<CurrencyCode, Decimal>,
        target: &CurrencyCode,
    ) -> Result<BalanceSummary, RateError> {
        let conversions = balances.iter().map(|(currency, balance)| async move {
            let converted = self
                .engine
                .convert(ctx, *balance, currency, target)
                .await
                .inspect_err(|e| {
                    warn!(
                        from_currency = %currency,
                        to_currency = %target,
                        pair = ?e.pair(),
                        error = %e,
                        "Failed to convert currency"
                    );
                })?;
            Ok::<_, RateError>(ConvertedBalance {
                currency: currency.clone(),
                balance: *balance,
                converted,
            })
        });

        let lines = try_join_all(conversions).await?;
        let total = lines.iter().try_fold(Decimal::ZERO, |total, line| {
            total.checked_add(line.converted).ok_or_else(|| {
                warn!(%total, currency = %line.currency, to_currency = %target, "Total out of range");
                RateError::Overflow {
                    pair: RatePair::new(line.currency.clone(), target.clone()),
                }
            })
        })?;
        debug!(target_currency = %target, %total, currencies = lines.len(), "Balances aggregated");

        Ok(BalanceSummary {
            target_currency: target.clone(),
            lines,
            total,
        })
    }

    pub async fn total(
        &self,
        ctx: &Context,
        balances: &BTreeMap<CurrencyCode, Decimal>,
        target: &CurrencyCode,
    ) -> Result<Decimal, RateError> {
        Ok(self.aggregate(ctx, balances, target).await?.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::tests::new_engine;
    use rust_decimal_macros::dec;

    fn balances(entries: &[(&str, Decimal)]) -> BTreeMap<CurrencyCode, Decimal> {
        entries
            .iter()
            .map(|(code, amount)| (CurrencyCode::from(*code), *amount))
            .collect()
    }

    #[tokio::test]
    async fn test_mixed_currencies_total() {
        let (engine, source, _clock) = new_engine();
        source.add_rate("USD", "USD", dec!(1));
        source.add_rate("EUR", "USD", dec!(1.10));
        let aggregator = BalanceAggregator::new(Arc::new(engine));

        let summary = aggregator
            .aggregate(
                &Context::background(),
                &balances(&[("USD", dec!(100.00)), ("EUR", dec!(50.00))]),
                &"USD".into(),
            )
            .await
            .unwrap();

        assert_eq!(summary.total, dec!(155.00));
        assert_eq!(summary.target_currency.as_str(), "USD");
        assert_eq!(
            summary.lines,
            vec![
                ConvertedBalance {
                    currency: "EUR".into(),
                    balance: dec!(50.00),
                    converted: dec!(55.00),
                },
                ConvertedBalance {
                    currency: "USD".into(),
                    balance: dec!(100.00),
                    converted: dec!(100.00),
                },
            ]
        );
        // Same-currency balance still asked the source for a rate
        assert_eq!(source.calls("USD", "USD"), 1);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_rounded_terms() {
        let (engine, source, _clock) = new_engine();
        source.add_rate("GBP", "EUR", dec!(1.005));
        source.add_rate("CHF", "EUR", dec!(1.005));
        let aggregator = BalanceAggregator::new(Arc::new(engine));

        // Each term is 1.005 -> 1.01; rounding the raw sum would give 2.01
        let total = aggregator
            .total(
                &Context::background(),
                &balances(&[("GBP", dec!(1)), ("CHF", dec!(1))]),
                &"EUR".into(),
            )
            .await
            .unwrap();

        assert_eq!(total, dec!(2.02));
    }

    #[tokio::test]
    async fn test_first_failure_aborts_aggregation() {
        let (engine, source, _clock) = new_engine();
        source.add_rate("USD", "EUR", dec!(0.92));
        let err = RateError::Upstream {
            pair: RatePair::new("GBP", "EUR"),
            status: 503,
            body: String::new(),
        };
        source.add_error("GBP", "EUR", err.clone());
        let aggregator = BalanceAggregator::new(Arc::new(engine));

        let result = aggregator
            .aggregate(
                &Context::background(),
                &balances(&[("USD", dec!(10)), ("GBP", dec!(20))]),
                &"EUR".into(),
            )
            .await;

        assert_eq!(result, Err(err));
    }

    #[tokio::test]
    async fn test_total_out_of_range_is_overflow() {
        let (engine, source, _clock) = new_engine();
        source.add_rate("CHF", "EUR", dec!(1));
        source.add_rate("GBP", "EUR", dec!(1));
        let aggregator = BalanceAggregator::new(Arc::new(engine));

        // Each term converts fine on its own; only their sum leaves the range
        let result = aggregator
            .total(
                &Context::background(),
                &balances(&[("CHF", Decimal::MAX), ("GBP", Decimal::MAX)]),
                &"EUR".into(),
            )
            .await;

        assert_eq!(
            result,
            Err(RateError::Overflow {
                pair: RatePair::new("GBP", "EUR")
            })
        );
    }

    #[tokio::test]
    async fn test_empty_balances_total_zero() {
        let (engine, source, _clock) = new_engine();
        let aggregator = BalanceAggregator::new(Arc::new(engine));

        let summary = aggregator
            .aggregate(&Context::background(), &BTreeMap::new(), &"EUR".into())
            .await
            .unwrap();

        assert_eq!(summary.total, Decimal::ZERO);
        assert!(summary.lines.is_empty());
        assert_eq!(source.total_calls(), 0);
    }
}
