//! Purchase ledger and return queue types
//!
//! A `Purchase` is a committed sale; it exists until a return filed against
//! it is approved (refund + restock) and is left standing when a return is
//! rejected. A `ReturnRequest` references exactly one purchase, and each
//! purchase can carry at most one open request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{ProductId, UserId};

/// Purchase identifier, assigned sequentially by the ledger
pub type PurchaseId = u64;

/// A committed sale
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    /// The purchase ID
    pub id: PurchaseId,

    /// The buying user
    pub buyer: UserId,

    /// The purchased product
    pub product: ProductId,

    /// Units bought (positive)
    pub quantity: u32,

    /// Server-assigned commit time; immutable, anchors the return window
    pub at: DateTime<Utc>,
}

/// A pending return request awaiting admin resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRequest {
    /// The purchase this request refers to
    pub purchase: PurchaseId,

    /// Server-assigned filing time
    pub requested_at: DateTime<Utc>,
}

/// One row of a buyer's purchase history listing
///
/// `total` is the read-side derivation quantity x unit price; nothing is
/// mutated to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseLine {
    /// The purchase ID
    pub purchase: PurchaseId,

    /// The buying user
    pub buyer: UserId,

    /// The purchased product
    pub product: ProductId,

    /// Product display name at listing time
    pub product_name: String,

    /// Units bought
    pub quantity: u32,

    /// Unit price at listing time
    pub unit_price: Decimal,

    /// quantity x unit price
    pub total: Decimal,

    /// Purchase commit time
    pub at: DateTime<Utc>,
}

/// One row of the admin pending-return listing
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnLine {
    /// The purchase under request
    pub purchase: PurchaseId,

    /// The buyer who filed the request
    pub buyer: UserId,

    /// The product on the purchase
    pub product: ProductId,

    /// Product display name at listing time
    pub product_name: String,

    /// Units on the purchase
    pub quantity: u32,

    /// Refund value if approved: quantity x unit price
    pub refund_value: Decimal,

    /// Request filing time
    pub requested_at: DateTime<Utc>,
}
