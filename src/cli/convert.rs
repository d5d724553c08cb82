use super::ui;
use crate::core::context::Context;
use crate::core::currency::{CurrencyCode, Money};
use crate::core::engine::ConversionEngine;
use crate::core::ledger::format_balance;
use anyhow::{Result, bail};
use tracing::error;

/// Converts a single amount and prints `from = to`.
pub async fn run(engine: &ConversionEngine, money: &Money, to: &CurrencyCode) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rate...");
    let result = engine
        .convert_amount(&Context::background(), money, to)
        .await;
    pb.finish_and_clear();

    let converted = match result {
        Ok(converted) => converted,
        Err(e) => {
            error!(
                error = %e,
                details = ?e,
                pair = ?e.pair(),
                amount = %money,
                "Conversion failed"
            );
            bail!("Failed to convert {} to {}, please try again", money.currency, to)
        }
    };

    println!(
        "{} = {}",
        format_balance(money.amount, &money.currency),
        ui::style_text(
            &format_balance(converted.amount, &converted.currency),
            ui::StyleType::TotalValue
        )
    );
    Ok(())
}
