//! Aggregator: rolls ledger entries up into per-entity P&L summaries.
//!
//! Totals only count `APPROVED` entries. Pending and rejected entries still show
//! up in `entry_count` so screens can render "N entries".

use chrono::{DateTime, Utc};
use fleet_core::{Direction, LedgerEntry, OwnerEntityType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Key used for entries whose owner id is missing.
pub const UNASSIGNED: &str = "UNASSIGNED";

/// What to group entries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    #[serde(rename = "driver")]
    Driver,
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "truck")]
    Truck,
    #[serde(rename = "misc")]
    MiscCategory,
}

impl EntityKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "driver" | "drivers" => Some(Self::Driver),
            "client" | "clients" => Some(Self::Client),
            "truck" | "trucks" => Some(Self::Truck),
            "misc" | "category" | "misc_category" => Some(Self::MiscCategory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Client => "client",
            Self::Truck => "truck",
            Self::MiscCategory => "misc",
        }
    }

    fn owner_type(&self) -> OwnerEntityType {
        match self {
            Self::Driver => OwnerEntityType::Driver,
            Self::Client => OwnerEntityType::Client,
            Self::Truck => OwnerEntityType::Truck,
            Self::MiscCategory => OwnerEntityType::Misc,
        }
    }

    /// Partition key for `entry`, or None when it belongs to another entity kind.
    pub fn resolve(&self, entry: &LedgerEntry) -> Option<String> {
        if entry.owner_entity_type != self.owner_type() {
            return None;
        }
        match self {
            Self::MiscCategory => Some(entry.normalized_category()),
            _ => Some(
                entry
                    .owner_entity_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .unwrap_or(UNASSIGNED)
                    .to_string(),
            ),
        }
    }
}

impl From<OwnerEntityType> for EntityKey {
    fn from(owner: OwnerEntityType) -> Self {
        match owner {
            OwnerEntityType::Driver => Self::Driver,
            OwnerEntityType::Client => Self::Client,
            OwnerEntityType::Truck => Self::Truck,
            OwnerEntityType::Misc => Self::MiscCategory,
        }
    }
}

/// Per-entity rollup. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub entity_id: String,
    pub entity_label: String,
    pub income_total: i64,
    pub expense_total: i64,
    pub net_total: i64,
    pub entry_count: usize,
    pub approved_entry_count: usize,
}

/// Approved income/expense for one category inside an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub income_total: i64,
    pub expense_total: i64,
}

/// Builder for entity summaries.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    labels: HashMap<String, String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    include_unapproved: bool,
}

impl Summarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display labels keyed by entity id.
    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Inclusive window on each entry's effective date.
    pub fn with_window(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Count pending and rejected entries in totals too.
    pub fn include_unapproved(mut self, include: bool) -> Self {
        self.include_unapproved = include;
        self
    }

    fn in_window(&self, entry: &LedgerEntry) -> bool {
        let date = entry.sort_date();
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    fn counts(&self, entry: &LedgerEntry) -> bool {
        self.include_unapproved || entry.is_approved()
    }

    /// Entries in the window grouped by entity, in id order.
    pub fn partition<'a>(
        &self,
        entries: &'a [LedgerEntry],
        group_by: EntityKey,
    ) -> BTreeMap<String, Vec<&'a LedgerEntry>> {
        let mut groups: BTreeMap<String, Vec<&LedgerEntry>> = BTreeMap::new();
        for entry in entries.iter().filter(|e| self.in_window(e)) {
            if let Some(key) = group_by.resolve(entry) {
                groups.entry(key).or_default().push(entry);
            }
        }
        groups
    }

    pub fn summarize(&self, entries: &[LedgerEntry], group_by: EntityKey) -> Vec<EntitySummary> {
        let mut summaries: Vec<EntitySummary> = self
            .partition(entries, group_by)
            .into_iter()
            .map(|(entity_id, items)| {
                let counted: Vec<&LedgerEntry> =
                    items.iter().copied().filter(|e| self.counts(e)).collect();
                let income_total = sum_direction(&counted, Direction::Income);
                let expense_total = sum_direction(&counted, Direction::Expense);

                EntitySummary {
                    entity_label: self
                        .labels
                        .get(&entity_id)
                        .cloned()
                        .unwrap_or_else(|| entity_id.clone()),
                    entity_id,
                    income_total,
                    expense_total,
                    net_total: income_total.saturating_sub(expense_total),
                    entry_count: items.len(),
                    approved_entry_count: items.iter().filter(|e| e.is_approved()).count(),
                }
            })
            .collect();

        // Largest magnitude first
        summaries.sort_by(|a, b| {
            b.net_total
                .abs()
                .cmp(&a.net_total.abs())
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        summaries
    }

    /// Per-category income/expense for each entity, categories in name order.
    pub fn breakdown(
        &self,
        entries: &[LedgerEntry],
        group_by: EntityKey,
    ) -> BTreeMap<String, Vec<CategoryBreakdown>> {
        self.partition(entries, group_by)
            .into_iter()
            .map(|(entity_id, items)| {
                let mut by_category: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();
                for entry in items.into_iter().filter(|e| self.counts(e)) {
                    let category = entry.normalized_category();
                    let row = by_category
                        .entry(category.clone())
                        .or_insert_with(|| CategoryBreakdown {
                            category,
                            income_total: 0,
                            expense_total: 0,
                        });
                    let total = match entry.direction {
                        Direction::Income => &mut row.income_total,
                        Direction::Expense => &mut row.expense_total,
                    };
                    *total = total.saturating_add(entry.normalized_amount());
                }
                (entity_id, by_category.into_values().collect())
            })
            .collect()
    }
}

/// Summarize approved entries with default options.
pub fn summarize(entries: &[LedgerEntry], group_by: EntityKey) -> Vec<EntitySummary> {
    Summarizer::new().summarize(entries, group_by)
}

fn sum_direction(entries: &[&LedgerEntry], direction: Direction) -> i64 {
    entries
        .iter()
        .filter(|e| e.direction == direction)
        .fold(0_i64, |acc, e| acc.saturating_add(e.normalized_amount()))
}
