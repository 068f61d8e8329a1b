//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, report serialization)
//! - `reader` - Streaming CSV reader with iterator interface

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_op_record, write_accounts_csv, write_catalog_csv, write_purchases_csv,
    write_returns_csv, OpRecord, Operation, ParsedOp,
};
pub use reader::OpReader;
