//! Core business logic module
//!
//! This module contains the storefront transaction components:
//! - `engine` - Purchase and return orchestration
//! - `accounts` - Profile store and balance operations
//! - `catalog` - Product store and stock operations
//! - `ledger` - Purchase ledger and return-request queue
//! - `concurrent` - Shareable lock-per-row engine
//! - `auth` - Explicit role checks for admin-gated operations
//! - `clock` - Injectable time source
//! - `config` - Policy values (return window, starting cash)

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod concurrent;
pub mod config;
pub mod engine;
pub mod ledger;

pub use accounts::Accounts;
pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use concurrent::ConcurrentStoreEngine;
pub use config::StoreConfig;
pub use engine::StoreEngine;
pub use ledger::PurchaseLedger;
