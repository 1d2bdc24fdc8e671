//! Chronological reconciliation: order entries, split them into credit/debit and
//! carry a running balance.
//!
//! Reconciliation is a pure fold over a snapshot. Input order never matters:
//! entries are sorted by effective date, then id, then original position.

use fleet_core::{LedgerContext, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classifier::{ClassifiedType, classify_in};

/// A ledger entry placed in the reconciled ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledEntry {
    pub entry: LedgerEntry,
    pub classified_type: ClassifiedType,
    pub credit: i64,
    pub debit: i64,
    pub running_balance: i64,
}

impl ReconciledEntry {
    /// `credit - debit`
    pub fn signed_amount(&self) -> i64 {
        self.credit.saturating_sub(self.debit)
    }
}

/// Reconcile with each entry classified in its own context.
pub fn reconcile(entries: &[LedgerEntry]) -> Vec<ReconciledEntry> {
    fold(entries, |e| e.context())
}

/// Reconcile with every entry classified under `context`.
pub fn reconcile_in(entries: &[LedgerEntry], context: LedgerContext) -> Vec<ReconciledEntry> {
    fold(entries, |_| context)
}

fn fold(
    entries: &[LedgerEntry],
    context_of: impl Fn(&LedgerEntry) -> LedgerContext,
) -> Vec<ReconciledEntry> {
    chronological(entries)
        .into_iter()
        .scan(0_i64, |balance, entry| {
            let classified_type = classify_in(entry, context_of(entry));
            let amount = entry.normalized_amount();
            let (credit, debit) = if classified_type.is_inflow() {
                (amount, 0)
            } else {
                (0, amount)
            };
            *balance = balance.saturating_add(credit).saturating_sub(debit);

            Some(ReconciledEntry {
                entry: entry.clone(),
                classified_type,
                credit,
                debit,
                running_balance: *balance,
            })
        })
        .collect()
}

/// Entries sorted ascending by effective date, ties by id then input position.
pub fn chronological(entries: &[LedgerEntry]) -> Vec<&LedgerEntry> {
    let mut ordered: Vec<(usize, &LedgerEntry)> = entries.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| {
        a.sort_date()
            .cmp(&b.sort_date())
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| ia.cmp(ib))
    });
    ordered.into_iter().map(|(_, e)| e).collect()
}

/// Header figures for a reconciled ledger screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_credit: i64,
    pub total_debit: i64,
    pub closing_balance: i64,
    /// Entry count per classified label.
    pub counts_by_type: BTreeMap<String, usize>,
}

impl LedgerTotals {
    pub fn from_reconciled(ledger: &[ReconciledEntry]) -> Self {
        ledger.iter().fold(Self::default(), |mut totals, r| {
            totals.total_credit = totals.total_credit.saturating_add(r.credit);
            totals.total_debit = totals.total_debit.saturating_add(r.debit);
            totals.closing_balance = r.running_balance;
            *totals
                .counts_by_type
                .entry(r.classified_type.label().to_string())
                .or_insert(0) += 1;
            totals
        })
    }
}
