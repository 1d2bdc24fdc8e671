//! P&L report builder and the flattened row set handed to export collaborators.

use chrono::{DateTime, Utc};
use fleet_core::{ApprovalStatus, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::reconciler::{ReconciledEntry, reconcile};
use crate::summary::{EntityKey, EntitySummary, Summarizer};

/// What to report on.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub group_by: EntityKey,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub labels: HashMap<String, String>,
}

impl ReportQuery {
    pub fn new(group_by: EntityKey) -> Self {
        Self {
            group_by,
            from: None,
            to: None,
            labels: HashMap::new(),
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub income_total: i64,
    pub expense_total: i64,
    pub net_total: i64,
    pub entry_count: usize,
    pub approved_entry_count: usize,
}

impl ReportTotals {
    pub fn from_rows(rows: &[EntitySummary]) -> Self {
        let mut totals = rows.iter().fold(Self::default(), |mut t, row| {
            t.income_total = t.income_total.saturating_add(row.income_total);
            t.expense_total = t.expense_total.saturating_add(row.expense_total);
            t.entry_count += row.entry_count;
            t.approved_entry_count += row.approved_entry_count;
            t
        });
        totals.net_total = totals.income_total.saturating_sub(totals.expense_total);
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLossReport {
    pub group_by: EntityKey,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub rows: Vec<EntitySummary>,
    pub totals: ReportTotals,
    /// Entries in scope still waiting for sign-off.
    pub pending_count: usize,
    pub rejected_count: usize,
}

/// Build a P&L report over approved entries for the query's entity kind and window.
pub fn build_report(entries: &[LedgerEntry], query: &ReportQuery) -> ProfitLossReport {
    let summarizer = Summarizer::new()
        .with_labels(query.labels.clone())
        .with_window(query.from, query.to);

    let in_scope: Vec<&LedgerEntry> = summarizer
        .partition(entries, query.group_by)
        .into_values()
        .flatten()
        .collect();
    let status_count = |status: ApprovalStatus| {
        in_scope
            .iter()
            .filter(|e| e.approval_status == status)
            .count()
    };

    let rows = summarizer.summarize(entries, query.group_by);
    let totals = ReportTotals::from_rows(&rows);
    tracing::debug!(
        group_by = ?query.group_by,
        rows = rows.len(),
        net = totals.net_total,
        "built P&L report"
    );

    ProfitLossReport {
        group_by: query.group_by,
        from: query.from,
        to: query.to,
        pending_count: status_count(ApprovalStatus::Pending),
        rejected_count: status_count(ApprovalStatus::Rejected),
        rows,
        totals,
    }
}

/// One line of an exported ledger. Presentation layers format it, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    /// Entity label the row's running balance belongs to.
    pub entity: String,
    pub date: Option<DateTime<Utc>>,
    pub category: String,
    pub module: String,
    pub status: ApprovalStatus,
    pub signed_amount: i64,
    pub running_balance: i64,
    pub notes: String,
}

/// Flatten one entity's reconciled ledger in ledger order.
pub fn export_rows(entity: &str, ledger: &[ReconciledEntry]) -> Vec<ExportRow> {
    ledger
        .iter()
        .map(|r| ExportRow {
            entity: entity.to_string(),
            date: r.entry.effective_date.or(r.entry.created_at),
            category: r.classified_type.label().to_string(),
            module: r.entry.source_module.to_string(),
            status: r.entry.approval_status,
            signed_amount: r.signed_amount(),
            running_balance: r.running_balance,
            notes: r.entry.remarks.clone().unwrap_or_default(),
        })
        .collect()
}

/// Export rows for every entity in the query's scope, all statuses included.
///
/// Each entity is reconciled on its own, so running balances never mix
/// across drivers, clients or trucks. Entities come in id order.
pub fn export_ledger(entries: &[LedgerEntry], query: &ReportQuery) -> Vec<ExportRow> {
    Summarizer::new()
        .with_window(query.from, query.to)
        .partition(entries, query.group_by)
        .into_iter()
        .flat_map(|(entity_id, items)| {
            let owned: Vec<LedgerEntry> = items.into_iter().cloned().collect();
            let label = query.labels.get(&entity_id).unwrap_or(&entity_id);
            export_rows(label, &reconcile(&owned))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleet_core::{Direction, OwnerEntityType, TransactionNature};

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, d, 10, 0, 0).unwrap()
    }

    fn client(id: &str, owner: &str, amount: i64, direction: Direction, d: u32) -> LedgerEntry {
        LedgerEntry::new(id, OwnerEntityType::Client, amount, direction)
            .with_owner(owner)
            .with_module("TRIP")
            .with_effective_date(at(d))
    }

    #[test]
    fn test_report_totals_and_status_counts() {
        let entries = vec![
            client("c1", "acme", 50_000, Direction::Income, 1),
            client("c2", "acme", 12_000, Direction::Expense, 2),
            client("c3", "zenith", 8_000, Direction::Income, 3)
                .with_status(ApprovalStatus::Pending),
            client("c4", "zenith", 3_000, Direction::Expense, 4)
                .with_status(ApprovalStatus::Rejected),
            client("c5", "zenith", 1_000, Direction::Income, 5),
        ];
        let report = build_report(&entries, &ReportQuery::new(EntityKey::Client));

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].entity_id, "acme");
        assert_eq!(report.totals.income_total, 51_000);
        assert_eq!(report.totals.expense_total, 12_000);
        assert_eq!(report.totals.net_total, 39_000);
        assert_eq!(report.totals.entry_count, 5);
        assert_eq!(report.totals.approved_entry_count, 3);
        assert_eq!(report.pending_count, 1);
        assert_eq!(report.rejected_count, 1);
    }

    #[test]
    fn test_report_window() {
        let entries = vec![
            client("c1", "acme", 500, Direction::Income, 1),
            client("c2", "acme", 200, Direction::Income, 15),
        ];
        let query = ReportQuery::new(EntityKey::Client).between(Some(at(10)), None);
        let report = build_report(&entries, &query);
        assert_eq!(report.totals.income_total, 200);
        assert_eq!(report.from, Some(at(10)));
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[], &ReportQuery::new(EntityKey::Truck));
        assert!(report.rows.is_empty());
        assert_eq!(report.totals, ReportTotals::default());
    }

    #[test]
    fn test_export_rows_follow_ledger() {
        let entries = vec![
            LedgerEntry::new("d2", OwnerEntityType::Driver, 300, Direction::Expense)
                .with_nature(TransactionNature::PaidByDriver)
                .with_module("DRIVER_LEDGER")
                .with_remarks("FUEL | Pune pump | UPI")
                .with_effective_date(at(2)),
            LedgerEntry::new("d1", OwnerEntityType::Driver, 1000, Direction::Income)
                .with_nature(TransactionNature::ReceivedByDriver)
                .with_module("DRIVER_LEDGER")
                .with_status(ApprovalStatus::Pending)
                .with_effective_date(at(1)),
        ];
        let rows = export_rows("drv-1", &reconcile(&entries));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "drv-1");
        assert_eq!(rows[0].category, "OWNER_TO_DRIVER");
        assert_eq!(rows[0].signed_amount, 1000);
        assert_eq!(rows[0].status, ApprovalStatus::Pending);
        assert_eq!(rows[1].signed_amount, -300);
        assert_eq!(rows[1].running_balance, 700);
        assert_eq!(rows[1].module, "DRIVER_LEDGER");
        assert_eq!(rows[1].notes, "FUEL | Pune pump | UPI");
    }

    #[test]
    fn test_export_ledger_balances_per_entity() {
        let entries = vec![
            client("c1", "acme", 500, Direction::Income, 1),
            client("c2", "zenith", 900, Direction::Income, 2),
            client("c3", "acme", 200, Direction::Expense, 3),
            client("c4", "zenith", 100, Direction::Expense, 4)
                .with_status(ApprovalStatus::Pending),
        ];
        let labels = HashMap::from([("acme".to_string(), "Acme Logistics".to_string())]);
        let query = ReportQuery::new(EntityKey::Client).with_labels(labels);
        let rows = export_ledger(&entries, &query);

        let got: Vec<_> = rows
            .iter()
            .map(|r| (r.entity.as_str(), r.signed_amount, r.running_balance))
            .collect();
        assert_eq!(
            got,
            [
                ("Acme Logistics", 500, 500),
                ("Acme Logistics", -200, 300),
                ("zenith", 900, 900),
                ("zenith", -100, 800),
            ]
        );
    }
}
