//! fleet-ledger: entry classifier, chronological reconciler, and P&L report builder

pub mod classifier;
pub mod reconciler;
pub mod report;
pub mod summary;

pub use classifier::{ClassifiedType, classify, classify_in};
pub use reconciler::{LedgerTotals, ReconciledEntry, chronological, reconcile, reconcile_in};
pub use report::{
    ExportRow, ProfitLossReport, ReportQuery, ReportTotals, build_report, export_ledger,
    export_rows,
};
pub use summary::{CategoryBreakdown, EntityKey, EntitySummary, Summarizer, summarize};
