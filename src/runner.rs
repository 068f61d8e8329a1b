//! Replay runner
//!
//! Orchestrates a batch run: streams operations from a CSV file, applies each
//! through the store engine, and writes the requested state report when the
//! file is exhausted.
//!
//! # Design
//!
//! The runner focuses on orchestration, delegating:
//! - CSV parsing to `OpReader` (iterator interface)
//! - Business rules to `StoreEngine`
//! - Report output to the `csv_format` writers
//!
//! # Time
//!
//! Each operation row may carry an `at` timestamp. The runner drives a
//! `ManualClock` from those timestamps, so return windows are evaluated
//! against the recorded submission times rather than wall time. Rows without
//! a timestamp run at whatever instant the clock last reached.
//!
//! # Error Handling
//!
//! Fatal errors (file not found, I/O errors) abort the run. Every other
//! error is scoped to its row: the row is logged and skipped, state is
//! unchanged, and processing continues.

use crate::cli::ReportKind;
use crate::core::{ManualClock, StoreConfig, StoreEngine};
use crate::io::csv_format::{
    write_accounts_csv, write_catalog_csv, write_purchases_csv, write_returns_csv, Operation,
};
use crate::io::reader::OpReader;
use crate::types::ShopError;
use chrono::Utc;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Counts for a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Operations applied successfully
    pub applied: usize,
    /// Rows skipped (parse failures and rejected operations)
    pub skipped: usize,
}

/// Batch replay over an operations file
///
/// ```no_run
/// use storefront_engine::runner::Replay;
/// use storefront_engine::cli::ReportKind;
/// use storefront_engine::core::StoreConfig;
/// use std::path::Path;
/// use std::io;
///
/// let runner = Replay::new(StoreConfig::default());
/// let mut output = io::stdout();
///
/// runner
///     .process(Path::new("ops.csv"), ReportKind::Accounts, &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct Replay {
    config: StoreConfig,
}

impl Replay {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Run the operations file and write the requested report
    ///
    /// Returns the applied/skipped counts, or the fatal error that aborted
    /// the run.
    pub fn process(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<RunSummary, ShopError> {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let mut engine = StoreEngine::with_clock(self.config.clone(), clock.clone());

        let reader = OpReader::new(input_path)?;
        let mut summary = RunSummary::default();

        for result in reader {
            let parsed = match result {
                Ok(parsed) => parsed,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping row: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };

            if let Some(at) = parsed.at {
                clock.set(at);
            }

            match apply(&mut engine, parsed.op) {
                Ok(()) => summary.applied += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Operation rejected: {}", e);
                    summary.skipped += 1;
                }
            }
        }

        match report {
            ReportKind::Accounts => {
                let profiles: Vec<_> = engine.profiles().into_iter().cloned().collect();
                write_accounts_csv(&profiles, output)?;
            }
            ReportKind::Catalog => {
                let products: Vec<_> = engine.products().into_iter().cloned().collect();
                write_catalog_csv(&products, output)?;
            }
            ReportKind::Purchases => write_purchases_csv(&engine.all_purchases(), output)?,
            ReportKind::Returns => write_returns_csv(&engine.pending_returns(), output)?,
        }

        Ok(summary)
    }
}

fn apply(engine: &mut StoreEngine, op: Operation) -> Result<(), ShopError> {
    match op {
        Operation::Register { user, role } => {
            engine.register(&user, role)?;
            tracing::info!("Registered '{}' as {:?}", user, role);
        }
        Operation::Stock { actor, product } => {
            let id = product.id;
            engine.stock_product(&actor, product)?;
            tracing::info!("Stocked product {}", id);
        }
        Operation::Purchase {
            buyer,
            product,
            quantity,
        } => {
            let receipt = engine.purchase(&buyer, product, quantity)?;
            tracing::info!("{}", receipt);
        }
        Operation::ReturnRequest { buyer, purchase } => {
            let receipt = engine.request_return(&buyer, purchase)?;
            tracing::info!("{}", receipt);
        }
        Operation::Approve { actor, purchase } => {
            let receipt = engine.approve_return(&actor, purchase)?;
            tracing::info!("{}", receipt);
        }
        Operation::Reject { actor, purchase } => {
            let receipt = engine.reject_return(&actor, purchase)?;
            tracing::info!("{}", receipt);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,at,user,role,product,purchase,qty,name,description,price,stock,image\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(content: &str, report: ReportKind) -> (RunSummary, String) {
        let file = create_temp_csv(content);
        let runner = Replay::new(StoreConfig::default());
        let mut output = Vec::new();
        let summary = runner.process(file.path(), report, &mut output).unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn replay_purchase_updates_accounts_report() {
        let content = format!(
            "{}register,,root,admin,,,,,,,,\n\
             register,,alice,,,,,,,,,\n\
             stock,,root,,1,,,Widget,,100.00,5,\n\
             purchase,,alice,,1,,2,,,,,\n",
            HEADER
        );

        let (summary, output) = run(&content, ReportKind::Accounts);

        assert_eq!(summary, RunSummary { applied: 4, skipped: 0 });
        assert!(output.contains("alice,9800.00"));
        assert!(output.contains("root,10000.00"));
    }

    #[test]
    fn replay_skips_rejected_rows_and_continues() {
        // alice never registers, so her purchase is rejected; bob's succeeds
        let content = format!(
            "{}register,,root,admin,,,,,,,,\n\
             register,,bob,,,,,,,,,\n\
             stock,,root,,1,,,Widget,,100.00,5,\n\
             purchase,,alice,,1,,2,,,,,\n\
             purchase,,bob,,1,,1,,,,,\n",
            HEADER
        );

        let (summary, output) = run(&content, ReportKind::Catalog);

        assert_eq!(summary, RunSummary { applied: 4, skipped: 1 });
        assert!(output.contains("1,Widget,100.00,4"));
    }

    #[test]
    fn replay_return_window_follows_timestamps() {
        // Purchase at noon; return filed five minutes later is outside the
        // default three-minute window.
        let content = format!(
            "{}register,2026-01-01T12:00:00Z,root,admin,,,,,,,,\n\
             register,2026-01-01T12:00:00Z,alice,,,,,,,,,\n\
             stock,2026-01-01T12:00:00Z,root,,1,,,Widget,,100.00,5,\n\
             purchase,2026-01-01T12:00:00Z,alice,,1,,2,,,,,\n\
             return,2026-01-01T12:05:00Z,alice,,,1,,,,,,\n",
            HEADER
        );

        let (summary, output) = run(&content, ReportKind::Returns);

        assert_eq!(summary.skipped, 1);
        assert_eq!(output, "purchase,buyer,product,name,qty,refund_value,requested_at\n");
    }

    #[test]
    fn replay_approved_return_refunds_and_restocks() {
        let content = format!(
            "{}register,2026-01-01T12:00:00Z,root,admin,,,,,,,,\n\
             register,2026-01-01T12:00:00Z,alice,,,,,,,,,\n\
             stock,2026-01-01T12:00:00Z,root,,1,,,Widget,,100.00,5,\n\
             purchase,2026-01-01T12:00:00Z,alice,,1,,2,,,,,\n\
             return,2026-01-01T12:02:00Z,alice,,,1,,,,,,\n\
             approve,2026-01-01T12:02:30Z,root,,,1,,,,,,\n",
            HEADER
        );

        let (summary, output) = run(&content, ReportKind::Accounts);

        assert_eq!(summary, RunSummary { applied: 6, skipped: 0 });
        assert!(output.contains("alice,10000.00"));
    }

    #[test]
    fn replay_purchases_report_lists_history() {
        let content = format!(
            "{}register,2026-01-01T12:00:00Z,root,admin,,,,,,,,\n\
             register,2026-01-01T12:00:00Z,alice,,,,,,,,,\n\
             stock,2026-01-01T12:00:00Z,root,,1,,,Widget,,100.00,5,\n\
             purchase,2026-01-01T12:00:00Z,alice,,1,,2,,,,,\n",
            HEADER
        );

        let (_, output) = run(&content, ReportKind::Purchases);

        assert!(output.starts_with("purchase,buyer,product,name,qty,unit_price,total,at\n"));
        assert!(output.contains("1,alice,1,Widget,2,100.00,200.00,2026-01-01T12:00:00+00:00"));
    }

    #[test]
    fn replay_missing_file_is_fatal() {
        let runner = Replay::new(StoreConfig::default());
        let mut output = Vec::new();

        let err = runner
            .process(Path::new("nonexistent.csv"), ReportKind::Accounts, &mut output)
            .unwrap_err();

        assert!(matches!(err, ShopError::FileNotFound { .. }));
        assert!(output.is_empty());
    }

    #[test]
    fn replay_continues_on_malformed_row() {
        let content = format!(
            "{}register,,alice,,,,,,,,,\n\
             teleport,,alice,,,,,,,,,\n\
             register,,bob,,,,,,,,,\n",
            HEADER
        );

        let (summary, output) = run(&content, ReportKind::Accounts);

        assert_eq!(summary, RunSummary { applied: 2, skipped: 1 });
        assert!(output.contains("alice"));
        assert!(output.contains("bob"));
    }
}
