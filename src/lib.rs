//! Storefront Engine Library
//! # Overview
//!
//! This library provides the transaction core of a small storefront: a
//! product catalog with stock, user profiles with cash balances, purchases,
//! and time-windowed returns with admin approval. A CSV replay runner applies
//! recorded operations and reports the resulting state.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Product, Profile, Purchase, receipts)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Purchase and return orchestration
//!   - [`core::accounts`] - Profile state and balance operations
//!   - [`core::catalog`] - Product state and stock operations
//!   - [`core::ledger`] - Purchase history and return-request queue
//!   - [`core::concurrent`] - Shareable engine for overlapping callers
//! - [`io`] - CSV reading and report serialization
//! - [`runner`] - Batch replay orchestration
//!
//! # Operations
//!
//! The engine supports six operations:
//!
//! - **Register**: Create a profile with a starting cash balance
//! - **Stock**: Admin create/update of a catalog product
//! - **Purchase**: Buy a quantity of one product (requires stock and funds)
//! - **Return**: File a return request within the return window
//! - **Approve**: Admin refunds the buyer and restocks the units
//! - **Reject**: Admin dismisses the request; the buyer keeps the goods
//!
//! # Invariants
//!
//! Every operation either commits in full or leaves state untouched. A
//! purchase requires the total cost to be strictly below the buyer's cash.
//! At most one return request is open per purchase, and an approved return
//! can never refund twice.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod runner;
pub mod types;

pub use crate::core::{ConcurrentStoreEngine, StoreConfig, StoreEngine};
pub use crate::io::write_accounts_csv;
pub use crate::runner::{Replay, RunSummary};
pub use crate::types::{
    Product, ProductId, Profile, Purchase, PurchaseId, Role, ShopError, UserId,
};
