use super::ui;
use crate::core::aggregate::{BalanceAggregator, BalanceSummary};
use crate::core::context::Context;
use crate::core::currency::CurrencyCode;
use crate::core::ledger::{Account, balances_by_currency, format_balance};
use anyhow::{Result, bail};
use comfy_table::Cell;
use rust_decimal::Decimal;
use tracing::error;

impl BalanceSummary {
    pub fn display_as_table(&self) -> String {
        let target_currency = &self.target_currency;

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Balance"),
            ui::header_cell(&format!("Value ({target_currency})")),
        ]);

        for line in &self.lines {
            table.add_row(vec![
                Cell::new(line.currency.as_str()),
                ui::amount_cell(
                    format_balance(line.balance, &line.currency),
                    line.balance < Decimal::ZERO,
                ),
                ui::amount_cell(
                    format_balance(line.converted, target_currency),
                    line.converted < Decimal::ZERO,
                ),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Total balance", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal ({}): {}",
            ui::style_text(target_currency.as_str(), ui::StyleType::TotalLabel),
            ui::style_text(
                &format_balance(self.total, target_currency),
                ui::StyleType::TotalValue
            )
        ));

        output
    }
}

/// Computes the dashboard total for `accounts` and prints it.
pub async fn run(
    accounts: &[Account],
    aggregator: &BalanceAggregator,
    target_currency: &CurrencyCode,
) -> Result<()> {
    let summary = summarize(accounts, aggregator, target_currency).await?;
    println!("{}", summary.display_as_table());
    Ok(())
}

pub async fn summarize(
    accounts: &[Account],
    aggregator: &BalanceAggregator,
    target_currency: &CurrencyCode,
) -> Result<BalanceSummary> {
    let balances = balances_by_currency(accounts)?;

    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = aggregator
        .aggregate(&Context::background(), &balances, target_currency)
        .await;
    pb.finish_and_clear();

    match result {
        Ok(summary) => Ok(summary),
        Err(e) => {
            error!(
                error = %e,
                details = ?e,
                pair = ?e.pair(),
                to_currency = %target_currency,
                "Failed to calculate total balance"
            );
            bail!("Failed to calculate total balance, please try again")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::ConvertedBalance;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_as_table() {
        let summary = BalanceSummary {
            target_currency: "USD".into(),
            lines: vec![
                ConvertedBalance {
                    currency: "EUR".into(),
                    balance: dec!(50),
                    converted: dec!(55.00),
                },
                ConvertedBalance {
                    currency: "USD".into(),
                    balance: dec!(100),
                    converted: dec!(100.00),
                },
            ],
            total: dec!(155.00),
        };

        let output = console::strip_ansi_codes(&summary.display_as_table()).to_string();
        assert!(output.contains("Value (USD)"));
        assert!(output.contains("€50.00"));
        assert!(output.contains("$55.00"));
        assert!(output.contains("Total (USD): $155.00"));
    }
}
