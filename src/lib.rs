pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{
    BalanceAggregator, Clock, ConversionEngine, CurrencyCode, Money, RateCache, SystemClock,
};
use crate::providers::HexarateSource;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub use crate::core::config;

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Total of all active accounts, optionally in another currency
    Total { currency: Option<CurrencyCode> },
    Accounts,
    Convert { money: Money, to: CurrencyCode },
}

/// Process wide services, built once from the configuration and shared by
/// every command.
pub struct App {
    pub engine: Arc<ConversionEngine>,
    pub aggregator: BalanceAggregator,
}

impl App {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let cache = Arc::new(
            RateCache::new(config.rates.cache_ttl(), Arc::clone(&clock))
                .context("Failed to create rate cache")?,
        );
        let source = HexarateSource::with_clock(&config.rates.base_url, config.rates.timeout(), clock)
            .context("Failed to create rate source")?;
        let engine = Arc::new(ConversionEngine::new(Arc::new(source), cache));
        let aggregator = BalanceAggregator::new(Arc::clone(&engine));

        Ok(App { engine, aggregator })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ledgerfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Accounts => {
            cli::accounts::run(&config.accounts);
            Ok(())
        }
        AppCommand::Total { currency } => {
            let app = App::from_config(&config)?;
            let target = currency.unwrap_or_else(|| config.currency.clone());
            cli::total::run(&config.accounts, &app.aggregator, &target).await
        }
        AppCommand::Convert { money, to } => {
            let app = App::from_config(&config)?;
            cli::convert::run(&app.engine, &money, &to).await
        }
    }
}
