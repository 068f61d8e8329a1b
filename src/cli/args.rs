use crate::core::StoreConfig;
use chrono::Duration;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Replay store operations and report the resulting state
#[derive(Parser, Debug)]
#[command(name = "storefront-engine")]
#[command(about = "Replay store operations and report the resulting state", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Report to write after the replay
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "accounts",
        help = "Report to write: 'accounts', 'catalog', 'purchases' or 'returns'"
    )]
    pub report: ReportKind,

    /// Return window length in seconds
    #[arg(
        long = "return-window",
        value_name = "SECONDS",
        help = "Seconds after a purchase during which a return may be filed (default: 180)"
    )]
    pub return_window_secs: Option<i64>,

    /// Cash balance granted to each newly registered profile
    #[arg(
        long = "starting-cash",
        value_name = "AMOUNT",
        help = "Cash balance granted on registration (default: 10000.00)"
    )]
    pub starting_cash: Option<Decimal>,

    /// Commit retries for the concurrent engine
    #[arg(
        long = "commit-retries",
        value_name = "COUNT",
        help = "Retries before a conflicted commit is reported (default: 5)"
    )]
    pub commit_retries: Option<u32>,
}

/// Available state reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Profile balances
    Accounts,
    /// Products with price and remaining stock
    Catalog,
    /// Full purchase history
    Purchases,
    /// Open return requests
    Returns,
}

impl CliArgs {
    /// Create a StoreConfig from CLI arguments
    ///
    /// Uses CLI values where provided, falling back to defaults otherwise.
    /// Out-of-range values are corrected by `StoreConfig::new`, which warns
    /// and substitutes the default.
    pub fn to_store_config(&self) -> StoreConfig {
        let default = StoreConfig::default();
        StoreConfig::new(
            self.return_window_secs
                .map(Duration::seconds)
                .unwrap_or(default.return_window),
            self.starting_cash.unwrap_or(default.starting_cash),
            self.commit_retries.unwrap_or(default.commit_retries),
        )
    }
}
