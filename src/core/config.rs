use crate::core::cache::{DEFAULT_TTL, MAX_TTL};
use crate::core::currency::CurrencyCode;
use crate::core::ledger::{Account, balances_by_currency};
use crate::providers::hexarate::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Currency the dashboard total is reported in.
    pub currency: CurrencyCode,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub rates: RatesConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ledgerfx", "ledgerfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.currency.is_empty() {
            bail!("Reporting currency must not be empty");
        }
        if self.rates.timeout_secs == 0 {
            bail!("rates.timeout_secs must be greater than zero");
        }
        if self.rates.cache_ttl_secs == 0 {
            bail!("rates.cache_ttl_secs must be greater than zero");
        }
        if self.rates.cache_ttl() > MAX_TTL {
            bail!(
                "rates.cache_ttl_secs must not exceed {} seconds",
                MAX_TTL.as_secs()
            );
        }
        for account in &self.accounts {
            if account.currency.is_empty() {
                bail!("Account '{}' has an empty currency", account.name);
            }
            if account.balance < Decimal::ZERO && !account.allows_negative_balance {
                bail!(
                    "Account '{}' has a negative balance but does not allow one",
                    account.name
                );
            }
        }
        balances_by_currency(&self.accounts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::AccountType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "EUR"
accounts:
  - name: "Main checking"
    account_type: checking
    balance: "1250.40"
    currency: "EUR"
  - name: "US savings"
    account_type: savings
    balance: 3000
    currency: "USD"
  - name: "Overdraft"
    account_type: checking
    balance: "-45.10"
    currency: "USD"
    allows_negative_balance: true
  - name: "Old wallet"
    account_type: cash
    balance: "12.00"
    currency: "GBP"
    is_active: false
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency.as_str(), "EUR");
        assert_eq!(config.accounts.len(), 4);
        assert_eq!(config.accounts[0].name, "Main checking");
        assert_eq!(config.accounts[0].balance, dec!(1250.40));
        assert_eq!(config.accounts[1].account_type, AccountType::Savings);
        assert_eq!(config.accounts[1].balance, dec!(3000));
        assert!(config.accounts[2].allows_negative_balance);
        assert!(!config.accounts[3].is_active);
        assert_eq!(config.rates, RatesConfig::default());
        assert_eq!(config.rates.base_url, "https://hexarate.paikama.co/api/rates");
        assert_eq!(config.rates.timeout(), Duration::from_secs(10));
        assert_eq!(config.rates.cache_ttl(), Duration::from_secs(3600));
        config.validate().unwrap();

        let yaml_str_with_rates = r#"
currency: "USD"
rates:
  base_url: "http://example.com/rates"
  cache_ttl_secs: 60
        "#;
        let config_with_rates: AppConfig = serde_yaml::from_str(yaml_str_with_rates).unwrap();
        assert!(config_with_rates.accounts.is_empty());
        assert_eq!(config_with_rates.rates.base_url, "http://example.com/rates");
        assert_eq!(config_with_rates.rates.timeout_secs, 10);
        assert_eq!(config_with_rates.rates.cache_ttl_secs, 60);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
currency: "USD"
rates:
  cache_ttl_secs: 0
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache_ttl_secs"));
    }

    #[test]
    fn test_validate_rejects_huge_ttl() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
currency: "USD"
rates:
  cache_ttl_secs: 10000000000000
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "rates.cache_ttl_secs must not exceed 315360000 seconds"
        );
    }

    #[test]
    fn test_validate_rejects_balance_total_out_of_range() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
currency: "USD"
accounts:
  - name: "Vault"
    account_type: savings
    balance: "79228162514264337593543950335"
    currency: "USD"
  - name: "Reserve"
    account_type: savings
    balance: "79228162514264337593543950335"
    currency: "USD"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_rejects_unexpected_negative_balance() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
currency: "USD"
accounts:
  - name: "Cash"
    account_type: cash
    balance: "-1.00"
    currency: "USD"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Account 'Cash' has a negative balance but does not allow one"
        );
    }

    #[test]
    fn test_load_from_path_reports_invalid_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "currency: \"\"\n").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config file"));
    }
}
