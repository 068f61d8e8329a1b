//! User profile types
//!
//! Every registered user owns exactly one profile holding a spendable cash
//! balance. The balance is not a real payment method; it is debited by
//! purchases and credited by approved returns.

use rust_decimal::Decimal;

/// User identifier (the login name)
pub type UserId = String;

/// Role attached to a profile, checked by admin-gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular shopper: may purchase and file returns on own purchases
    Customer,

    /// Administrator: may manage the catalog and resolve returns
    Admin,
}

/// A user's store profile
///
/// Invariant: `cash` never goes negative after any committed transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// The owning user
    pub user: UserId,

    /// Spendable cash balance
    pub cash: Decimal,

    /// Role of this user
    pub role: Role,
}

impl Profile {
    /// Create a profile with the given starting balance
    pub fn new(user: &str, cash: Decimal, role: Role) -> Self {
        Profile {
            user: user.to_string(),
            cash,
            role,
        }
    }
}
