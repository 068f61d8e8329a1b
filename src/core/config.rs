//! Store configuration
//!
//! Policy values that were hard-coded in earlier iterations of this system
//! live here: the return window, the starting cash balance granted at
//! registration, and the commit retry bound of the concurrent engine.

use chrono::Duration;
use rust_decimal::Decimal;

/// Default return window in seconds
pub const DEFAULT_RETURN_WINDOW_SECS: i64 = 180;

/// Default starting cash balance, in whole currency units
const DEFAULT_STARTING_CASH: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 2);

/// Default bound on optimistic commit retries
pub const DEFAULT_COMMIT_RETRIES: u32 = 5;

/// Tunable policy values for a store engine
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// How long after a purchase a return request may be filed
    pub return_window: Duration,

    /// Cash balance granted to a profile at registration
    pub starting_cash: Decimal,

    /// How many times the concurrent engine retries a conflicted commit
    /// before surfacing the conflict
    pub commit_retries: u32,
}

impl StoreConfig {
    /// Create a configuration, falling back to defaults for out-of-range
    /// values
    ///
    /// A non-positive window or a zero retry count would make every return
    /// request or contended commit fail, so both fall back to their
    /// defaults with a warning.
    pub fn new(return_window: Duration, starting_cash: Decimal, commit_retries: u32) -> Self {
        let return_window = if return_window <= Duration::zero() {
            tracing::warn!(
                "non-positive return window, falling back to {}s",
                DEFAULT_RETURN_WINDOW_SECS
            );
            Duration::seconds(DEFAULT_RETURN_WINDOW_SECS)
        } else {
            return_window
        };

        let commit_retries = if commit_retries == 0 {
            tracing::warn!(
                "zero commit retries, falling back to {}",
                DEFAULT_COMMIT_RETRIES
            );
            DEFAULT_COMMIT_RETRIES
        } else {
            commit_retries
        };

        StoreConfig {
            return_window,
            starting_cash,
            commit_retries,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            return_window: Duration::seconds(DEFAULT_RETURN_WINDOW_SECS),
            starting_cash: DEFAULT_STARTING_CASH,
            commit_retries: DEFAULT_COMMIT_RETRIES,
        }
    }
}
