//! Error types for the storefront engine
//!
//! This module defines all error types that can occur while applying store
//! operations. Errors are designed to carry enough context to render a
//! user-facing warning without consulting any other state.
//!
//! # Error Categories
//!
//! - **File I/O errors**: file not found, permission denied, etc. These are
//!   the only errors fatal to a replay run.
//! - **CSV parsing errors**: malformed rows, missing fields, unknown ops.
//! - **Transaction errors**: insufficient stock or funds, expired return
//!   window, duplicate return request, missing records.
//! - **Concurrency errors**: a lost update detected after bounded retries.

use rust_decimal::Decimal;
use thiserror::Error;

use super::{ProductId, PurchaseId, UserId};

/// Main error type for the storefront engine
///
/// Every validation failure maps to a variant here. All variants except the
/// file-level I/O ones are recoverable: the offending operation is rejected
/// with state exactly preserved, and processing continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShopError {
    /// File not found at the specified path
    ///
    /// Fatal: prevents a replay run from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing
    ///
    /// Typically fatal (permissions, disk full, broken pipe).
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error
    ///
    /// Recoverable: the malformed row is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown operation name in the op column
    ///
    /// Recoverable: the row is skipped.
    #[error("Unknown operation '{op}'")]
    UnknownOp {
        /// The unrecognized operation string
        op: String,
    },

    /// A column required by this operation is empty
    ///
    /// Recoverable: the row is skipped.
    #[error("{op} operation requires a value for '{field}'")]
    MissingField {
        /// Operation that required the field
        op: String,
        /// Name of the missing column
        field: String,
    },

    /// No profile exists for the named user
    #[error("No profile found for user '{user}'")]
    ProfileNotFound {
        /// The user without a profile
        user: UserId,
    },

    /// A profile already exists for the named user
    ///
    /// Registration creates exactly one profile per user.
    #[error("A profile already exists for user '{user}'")]
    ProfileExists {
        /// The already-registered user
        user: UserId,
    },

    /// No product exists with the given id
    #[error("Product {product} not found")]
    ProductNotFound {
        /// The missing product id
        product: ProductId,
    },

    /// No purchase exists with the given id
    ///
    /// Also raised by a repeated approve on an already-resolved purchase,
    /// which therefore fails instead of double-refunding.
    #[error("Purchase {purchase} not found")]
    PurchaseNotFound {
        /// The missing purchase id
        purchase: PurchaseId,
    },

    /// No open return request exists for the given purchase
    #[error("No open return request for purchase {purchase}")]
    ReturnNotFound {
        /// The purchase without an open return
        purchase: PurchaseId,
    },

    /// The acting user lacks the role required for the operation
    #[error("User '{user}' is not allowed to {action}")]
    Forbidden {
        /// The acting user
        user: UserId,
        /// The attempted action
        action: String,
    },

    /// Requested quantity is zero
    ///
    /// Quantities are form-validated positive integers; zero never reaches
    /// a committed purchase.
    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    /// Not enough units in stock for the requested quantity
    ///
    /// Recoverable: the purchase is rejected and stock is unchanged.
    #[error("Insufficient stock for product {product}: {available} available, {requested} requested")]
    InsufficientStock {
        /// Product id
        product: ProductId,
        /// Units currently in stock
        available: u32,
        /// Units requested
        requested: u32,
    },

    /// The buyer's cash balance does not cover the total cost
    ///
    /// Recoverable: the purchase is rejected and the balance is unchanged.
    #[error("Insufficient funds for '{user}': total cost {cost}, cash {cash} (short {shortfall})")]
    InsufficientFunds {
        /// Buyer
        user: UserId,
        /// Total cost of the attempted purchase
        cost: Decimal,
        /// Current cash balance
        cash: Decimal,
        /// Amount by which the balance falls short
        shortfall: Decimal,
    },

    /// The purchase belongs to a different buyer
    ///
    /// Raised when a return request names a purchase the requester does not
    /// own.
    #[error("Purchase {purchase} belongs to '{owner}', not '{requester}'")]
    OwnerMismatch {
        /// Purchase id
        purchase: PurchaseId,
        /// The buyer on the purchase record
        owner: UserId,
        /// The user who filed the request
        requester: UserId,
    },

    /// The return window has elapsed for this purchase
    ///
    /// Recoverable: no return request is filed.
    #[error("Return window expired for purchase {purchase}: {elapsed_secs}s elapsed, window is {window_secs}s")]
    ReturnWindowExpired {
        /// Purchase id
        purchase: PurchaseId,
        /// Seconds elapsed since the purchase
        elapsed_secs: i64,
        /// Configured window length in seconds
        window_secs: i64,
    },

    /// A return request is already open for this purchase
    ///
    /// At most one open return per purchase.
    #[error("A return request is already open for purchase {purchase}")]
    DuplicateReturnRequest {
        /// Purchase id
        purchase: PurchaseId,
    },

    /// Arithmetic overflow would occur
    ///
    /// Recoverable: the operation is rejected to keep balances intact.
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// A concurrent writer kept invalidating the read-validate-commit
    /// sequence beyond the bounded retry count
    ///
    /// Transient: the caller may resubmit the operation.
    #[error("Concurrent update conflict while committing {operation}")]
    ConcurrencyConflict {
        /// Operation that could not be committed
        operation: String,
    },
}

impl From<std::io::Error> for ShopError {
    fn from(error: std::io::Error) -> Self {
        ShopError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ShopError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        ShopError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

// Helper constructors for the variants built in more than one place.

impl ShopError {
    /// Create a MissingField error
    pub fn missing_field(op: &str, field: &str) -> Self {
        ShopError::MissingField {
            op: op.to_string(),
            field: field.to_string(),
        }
    }

    /// Create a Forbidden error
    pub fn forbidden(user: &str, action: &str) -> Self {
        ShopError::Forbidden {
            user: user.to_string(),
            action: action.to_string(),
        }
    }

    /// Create an InsufficientStock error
    pub fn insufficient_stock(product: ProductId, available: u32, requested: u32) -> Self {
        ShopError::InsufficientStock {
            product,
            available,
            requested,
        }
    }

    /// Create an InsufficientFunds error, deriving the shortfall
    pub fn insufficient_funds(user: &str, cost: Decimal, cash: Decimal) -> Self {
        ShopError::InsufficientFunds {
            user: user.to_string(),
            cost,
            cash,
            shortfall: cost - cash,
        }
    }

    /// Create an OwnerMismatch error
    pub fn owner_mismatch(purchase: PurchaseId, owner: &str, requester: &str) -> Self {
        ShopError::OwnerMismatch {
            purchase,
            owner: owner.to_string(),
            requester: requester.to_string(),
        }
    }

    /// Create a ReturnWindowExpired error
    pub fn window_expired(purchase: PurchaseId, elapsed_secs: i64, window_secs: i64) -> Self {
        ShopError::ReturnWindowExpired {
            purchase,
            elapsed_secs,
            window_secs,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        ShopError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a ConcurrencyConflict error
    pub fn concurrency_conflict(operation: &str) -> Self {
        ShopError::ConcurrencyConflict {
            operation: operation.to_string(),
        }
    }

    /// Whether this error aborts a replay run
    ///
    /// Only file-level I/O failures are fatal; every other variant is scoped
    /// to the single operation that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShopError::FileNotFound { .. } | ShopError::Io { .. })
    }
}
