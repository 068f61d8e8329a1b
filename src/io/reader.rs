//! Streaming CSV reader with iterator interface
//!
//! Provides a streaming iterator over store operations from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as Err variants in the iterator
//! - Line numbers are included in parse errors for debugging
//!
//! # Memory Efficiency
//!
//! Rows are read one at a time; memory usage is O(1) per record, not
//! O(file_size).

use crate::io::csv_format::{convert_op_record, OpRecord, ParsedOp};
use crate::types::ShopError;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Streaming reader over an operations CSV file
///
/// Implements `Iterator`, yielding `Result<ParsedOp, ShopError>` per row:
///
/// ```no_run
/// use storefront_engine::io::reader::OpReader;
/// use std::path::Path;
///
/// let reader = OpReader::new(Path::new("ops.csv")).unwrap();
/// for result in reader {
///     match result {
///         Ok(parsed) => println!("Applying {:?}", parsed.op),
///         Err(e) => eprintln!("Skipping row: {}", e),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct OpReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl OpReader {
    /// Open an operations file for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields and allows flexible
    /// field counts, since most columns are operation-specific.
    pub fn new(path: &Path) -> Result<Self, ShopError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ShopError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ShopError::from(e)
            }
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for OpReader {
    type Item = Result<ParsedOp, ShopError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OpRecord>();

        match deserializer.next()? {
            Ok(record) => {
                self.line_num += 1;
                // Line 1 is the header row
                let line = (self.line_num + 1) as u64;
                Some(convert_op_record(record).map_err(|e| match e {
                    ShopError::Parse { message, .. } => ShopError::Parse {
                        line: Some(line),
                        message,
                    },
                    other => other,
                }))
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(ShopError::Parse {
                    line: Some((self.line_num + 1) as u64),
                    message: format!("CSV parse error: {}", e),
                }))
            }
        }
    }
}
