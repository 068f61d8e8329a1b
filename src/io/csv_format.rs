//! CSV format handling for store operations and state reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - `OpRecord` structure for deserialization of the operations file
//! - Conversion from raw records to validated `Operation` values
//! - Report serialization (accounts, catalog, purchases, returns)
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    Product, ProductId, Profile, PurchaseId, PurchaseLine, ReturnLine, Role, ShopError, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the operations file with columns:
/// `op,at,user,role,product,purchase,qty,name,description,price,stock,image`.
/// Everything but `op` is optional; each operation validates the columns it
/// needs during conversion.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct OpRecord {
    pub op: String,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub purchase: Option<PurchaseId>,
    #[serde(default)]
    pub qty: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated store operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create an account and its profile
    Register { user: UserId, role: Role },
    /// Admin create/update of a catalog product
    Stock { actor: UserId, product: Product },
    /// Buyer purchase of a quantity of one product
    Purchase {
        buyer: UserId,
        product: ProductId,
        quantity: u32,
    },
    /// Buyer files a return request against a purchase
    ReturnRequest { buyer: UserId, purchase: PurchaseId },
    /// Admin approves a return
    Approve { actor: UserId, purchase: PurchaseId },
    /// Admin rejects a return
    Reject { actor: UserId, purchase: PurchaseId },
}

/// An operation plus the instant it was submitted
///
/// The timestamp drives the replay clock; live callers omit it and take
/// server time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOp {
    /// Submission time, if the row carries one
    pub at: Option<DateTime<Utc>>,
    /// The validated operation
    pub op: Operation,
}

fn require<T>(value: Option<T>, op: &str, field: &str) -> Result<T, ShopError> {
    value.ok_or_else(|| ShopError::missing_field(op, field))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_price(price: Option<String>, op: &str) -> Result<Decimal, ShopError> {
    let raw = require(non_empty(price), op, "price")?;
    Decimal::from_str(raw.trim()).map_err(|_| ShopError::Parse {
        line: None,
        message: format!("Invalid price '{}'", raw),
    })
}

/// Convert an `OpRecord` to a `ParsedOp`
///
/// This function:
/// - Parses the operation name (case-insensitive)
/// - Parses the optional RFC 3339 timestamp
/// - Validates that the columns each operation needs are present
/// - Parses prices into `Decimal` and roles into [`Role`]
pub fn convert_op_record(record: OpRecord) -> Result<ParsedOp, ShopError> {
    let at = match non_empty(record.at) {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ShopError::Parse {
                    line: None,
                    message: format!("Invalid timestamp '{}': {}", raw, e),
                })?,
        ),
        None => None,
    };

    let op_name = record.op.trim().to_lowercase();
    let user = non_empty(record.user);

    let op = match op_name.as_str() {
        "register" => {
            let role = match non_empty(record.role).as_deref() {
                None | Some("customer") => Role::Customer,
                Some("admin") => Role::Admin,
                Some(other) => {
                    return Err(ShopError::Parse {
                        line: None,
                        message: format!("Invalid role '{}'", other),
                    })
                }
            };
            Operation::Register {
                user: require(user, &op_name, "user")?,
                role,
            }
        }
        "stock" => {
            let id = require(record.product, &op_name, "product")?;
            let name = require(non_empty(record.name), &op_name, "name")?;
            let price = parse_price(record.price, &op_name)?;
            let stock = require(record.stock, &op_name, "stock")?;
            Operation::Stock {
                actor: require(user, &op_name, "user")?,
                product: Product {
                    id,
                    name,
                    description: non_empty(record.description).unwrap_or_default(),
                    price,
                    stock,
                    image: non_empty(record.image),
                },
            }
        }
        "purchase" => Operation::Purchase {
            buyer: require(user, &op_name, "user")?,
            product: require(record.product, &op_name, "product")?,
            quantity: require(record.qty, &op_name, "qty")?,
        },
        "return" => Operation::ReturnRequest {
            buyer: require(user, &op_name, "user")?,
            purchase: require(record.purchase, &op_name, "purchase")?,
        },
        "approve" => Operation::Approve {
            actor: require(user, &op_name, "user")?,
            purchase: require(record.purchase, &op_name, "purchase")?,
        },
        "reject" => Operation::Reject {
            actor: require(user, &op_name, "user")?,
            purchase: require(record.purchase, &op_name, "purchase")?,
        },
        _ => return Err(ShopError::UnknownOp { op: record.op }),
    };

    Ok(ParsedOp { at, op })
}

/// Write profile balances to CSV
///
/// Columns `user,cash`, sorted by user for deterministic output; balances
/// rendered with two decimal places.
pub fn write_accounts_csv(profiles: &[Profile], output: &mut dyn Write) -> Result<(), ShopError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["user", "cash"])
        .map_err(write_error)?;

    let mut sorted: Vec<&Profile> = profiles.iter().collect();
    sorted.sort_by(|a, b| a.user.cmp(&b.user));

    for profile in sorted {
        writer
            .write_record(&[profile.user.clone(), format!("{:.2}", profile.cash)])
            .map_err(write_error)?;
    }

    writer.flush().map_err(ShopError::from)
}

/// Write the catalog to CSV: `product,name,price,stock`, sorted by id
pub fn write_catalog_csv(products: &[Product], output: &mut dyn Write) -> Result<(), ShopError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["product", "name", "price", "stock"])
        .map_err(write_error)?;

    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by_key(|p| p.id);

    for product in sorted {
        writer
            .write_record(&[
                product.id.to_string(),
                product.name.clone(),
                format!("{:.2}", product.price),
                product.stock.to_string(),
            ])
            .map_err(write_error)?;
    }

    writer.flush().map_err(ShopError::from)
}

/// Write purchase history rows to CSV
///
/// Columns `purchase,buyer,product,name,qty,unit_price,total,at`; the total
/// column is the derived quantity x unit price.
pub fn write_purchases_csv(
    lines: &[PurchaseLine],
    output: &mut dyn Write,
) -> Result<(), ShopError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "purchase",
            "buyer",
            "product",
            "name",
            "qty",
            "unit_price",
            "total",
            "at",
        ])
        .map_err(write_error)?;

    for line in lines {
        writer
            .write_record(&[
                line.purchase.to_string(),
                line.buyer.clone(),
                line.product.to_string(),
                line.product_name.clone(),
                line.quantity.to_string(),
                format!("{:.2}", line.unit_price),
                format!("{:.2}", line.total),
                line.at.to_rfc3339(),
            ])
            .map_err(write_error)?;
    }

    writer.flush().map_err(ShopError::from)
}

/// Write the pending-return listing to CSV
///
/// Columns `purchase,buyer,product,name,qty,refund_value,requested_at`.
pub fn write_returns_csv(lines: &[ReturnLine], output: &mut dyn Write) -> Result<(), ShopError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "purchase",
            "buyer",
            "product",
            "name",
            "qty",
            "refund_value",
            "requested_at",
        ])
        .map_err(write_error)?;

    for line in lines {
        writer
            .write_record(&[
                line.purchase.to_string(),
                line.buyer.clone(),
                line.product.to_string(),
                line.product_name.clone(),
                line.quantity.to_string(),
                format!("{:.2}", line.refund_value),
                line.requested_at.to_rfc3339(),
            ])
            .map_err(write_error)?;
    }

    writer.flush().map_err(ShopError::from)
}

fn write_error(error: csv::Error) -> ShopError {
    ShopError::Io {
        message: error.to_string(),
    }
}
