//! Operation receipts
//!
//! Each successful engine operation returns a typed receipt. The `Display`
//! implementation renders the user-facing confirmation message; the fields
//! stay structured so a presentation layer can format them differently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

use super::{PurchaseId, UserId};

/// Confirmation of a committed purchase
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    /// The new purchase's ID
    pub purchase: PurchaseId,

    /// The buying user
    pub buyer: UserId,

    /// Product display name
    pub product_name: String,

    /// Units bought
    pub quantity: u32,

    /// Total cost debited
    pub total: Decimal,
}

impl fmt::Display for PurchaseReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bought {} x {} for {}",
            self.buyer, self.quantity, self.product_name, self.total
        )
    }
}

/// Confirmation of a filed return request
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReceipt {
    /// The purchase under request
    pub purchase: PurchaseId,

    /// Product display name
    pub product_name: String,

    /// Units on the purchase
    pub quantity: u32,

    /// Original purchase time
    pub purchased_at: DateTime<Utc>,
}

impl fmt::Display for ReturnReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Return requested for {} x {} purchased at {}",
            self.quantity,
            self.product_name,
            self.purchased_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Confirmation of an approved return: refund credited, stock restored
#[derive(Debug, Clone, PartialEq)]
pub struct RefundReceipt {
    /// The resolved purchase's ID
    pub purchase: PurchaseId,

    /// The refunded buyer
    pub buyer: UserId,

    /// Product display name
    pub product_name: String,

    /// Units restocked
    pub quantity: u32,

    /// Cash credited back
    pub refund: Decimal,
}

impl fmt::Display for RefundReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Refunded {} to {} for {} x {} ({} units restocked)",
            self.refund, self.buyer, self.quantity, self.product_name, self.quantity
        )
    }
}

/// Confirmation of a rejected return: the purchase stands
#[derive(Debug, Clone, PartialEq)]
pub struct RejectionReceipt {
    /// The purchase whose return was rejected
    pub purchase: PurchaseId,

    /// The buyer who keeps the item
    pub buyer: UserId,

    /// Product display name
    pub product_name: String,
}

impl fmt::Display for RejectionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Return for purchase {} rejected; the {} remains with {}",
            self.purchase, self.product_name, self.buyer
        )
    }
}
