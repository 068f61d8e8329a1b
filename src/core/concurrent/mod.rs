//! Concurrent store engine
//!
//! A shareable (`&self`) variant of the store engine for callers that serve
//! overlapping requests. Rows live in `DashMap`s with a per-row version
//! counter; each operation reads a snapshot, validates, then re-locks the
//! rows in a fixed order and commits only if no other writer got there
//! first. A conflicted commit retries a bounded number of times before
//! surfacing `ConcurrencyConflict`.
//!
//! The guarantee this buys: two simultaneous purchases of the last units of
//! a product can never both succeed, and no debit or credit is ever lost.

pub mod engine;

pub use engine::ConcurrentStoreEngine;
