//! Accounts and the per-currency balances the dashboard total is built from.

use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Cash,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::Cash => "Cash",
        };
        f.write_str(name)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub allows_negative_balance: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Sums balances of active accounts, one entry per currency held.
///
/// Fails when a currency's sum does not fit in a `Decimal`.
pub fn balances_by_currency(accounts: &[Account]) -> Result<BTreeMap<CurrencyCode, Decimal>> {
    let mut balances = BTreeMap::new();
    for account in accounts.iter().filter(|a| a.is_active) {
        let sum = balances
            .entry(account.currency.clone())
            .or_insert(Decimal::ZERO);
        *sum = sum.checked_add(account.balance).with_context(|| {
            format!(
                "Total {} balance is out of range at account '{}'",
                account.currency, account.name
            )
        })?;
    }
    Ok(balances)
}

/// Renders an amount the way the dashboard shows it, e.g. `$12.50` or `1500.00 дин`.
pub fn format_balance(amount: Decimal, currency: &CurrencyCode) -> String {
    let formatted = fixed(amount, 2);
    match currency.as_str() {
        "USD" => format!("${formatted}"),
        "EUR" => format!("€{formatted}"),
        "GBP" => format!("£{formatted}"),
        "RSD" => format!("{formatted} дин"),
        "JPY" => format!("¥{}", fixed(amount, 0)),
        "CHF" => format!("CHF {formatted}"),
        other => format!("{formatted} {other}"),
    }
}

fn fixed(amount: Decimal, dp: u32) -> String {
    let mut rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}
