//! Types module
//!
//! Core domain types for the storefront engine: catalog products, user
//! profiles, the purchase ledger rows, operation receipts, and errors.

pub mod error;
pub mod order;
pub mod product;
pub mod profile;
pub mod receipt;

pub use error::ShopError;
pub use order::{Purchase, PurchaseId, PurchaseLine, ReturnLine, ReturnRequest};
pub use product::{Product, ProductId};
pub use profile::{Profile, Role, UserId};
pub use receipt::{PurchaseReceipt, RefundReceipt, RejectionReceipt, ReturnReceipt};
