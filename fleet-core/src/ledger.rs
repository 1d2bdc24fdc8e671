//! Ledger entry types shared by the classifier, reconciler and report builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::approval::ApprovalStatus;

/// Category label used when an entry carries none.
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

/// Largest amount, in whole units, a single entry contributes to any total.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Which kind of entity owns an entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwnerEntityType {
    #[serde(rename = "driver")]
    Driver,
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "truck")]
    Truck,
    #[serde(rename = "misc")]
    Misc,
}

impl OwnerEntityType {
    /// Case-insensitive parse of the remote spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "driver" => Some(Self::Driver),
            "client" | "customer" => Some(Self::Client),
            "truck" | "vehicle" => Some(Self::Truck),
            "misc" | "miscellaneous" => Some(Self::Misc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Client => "client",
            Self::Truck => "truck",
            Self::Misc => "misc",
        }
    }
}

/// Source-reported nature of a money movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionNature {
    #[serde(rename = "received_by_driver")]
    ReceivedByDriver,
    #[serde(rename = "paid_by_driver")]
    PaidByDriver,
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl TransactionNature {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "received_by_driver" => Some(Self::ReceivedByDriver),
            "paid_by_driver" => Some(Self::PaidByDriver),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Direction implied by the nature when the source omits one.
    pub fn implied_direction(&self) -> Direction {
        match self {
            Self::ReceivedByDriver | Self::Income => Direction::Income,
            Self::PaidByDriver | Self::Expense => Direction::Expense,
        }
    }
}

/// P&L direction, orthogonal to [`TransactionNature`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    #[serde(rename = "INCOME")]
    Income,
    #[serde(rename = "EXPENSE")]
    Expense,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INCOME" | "CREDIT" | "IN" => Some(Self::Income),
            "EXPENSE" | "DEBIT" | "OUT" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

/// Subsystem an entry originated from. Unknown modules are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceModule {
    RunningExpense,
    Maintenance,
    Misc,
    DriverLedger,
    Other(String),
}

impl SourceModule {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RunningExpense => "RUNNING_EXPENSE",
            Self::Maintenance => "MAINTENANCE",
            Self::Misc => "MISC",
            Self::DriverLedger => "DRIVER_LEDGER",
            Self::Other(raw) => raw,
        }
    }

    /// Modules whose forms set category and direction explicitly.
    pub fn is_form_categorized(&self) -> bool {
        matches!(self, Self::RunningExpense | Self::Maintenance | Self::Misc)
    }
}

impl From<String> for SourceModule {
    fn from(raw: String) -> Self {
        let key = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match key.as_str() {
            "RUNNING_EXPENSE" | "RUNNING" => Self::RunningExpense,
            "MAINTENANCE" => Self::Maintenance,
            "MISC" | "MISCELLANEOUS" => Self::Misc,
            "DRIVER_LEDGER" | "DRIVER" => Self::DriverLedger,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for SourceModule {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<SourceModule> for String {
    fn from(module: SourceModule) -> Self {
        module.as_str().to_string()
    }
}

impl fmt::Display for SourceModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which bucketing rules apply to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerContext {
    /// Driver-facing ledger: owner transfers, driver spends, vendor payouts.
    DriverLedger,
    /// Misc, running and maintenance books where the form sets category and direction.
    Report,
}

impl LedgerContext {
    /// Resolve the context an entry belongs to from its module and owner.
    pub fn of(entry: &LedgerEntry) -> Self {
        match &entry.source_module {
            SourceModule::DriverLedger => Self::DriverLedger,
            m if m.is_form_categorized() => Self::Report,
            _ if entry.owner_entity_type == OwnerEntityType::Driver => Self::DriverLedger,
            _ => Self::Report,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "driver" | "driver_ledger" => Some(Self::DriverLedger),
            "report" | "misc" | "finance" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Sub-type, purpose and payment mode packed into `remarks` as
/// `"ADVANCE | purpose | mode"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkParts {
    pub subtype: Option<String>,
    pub purpose: Option<String>,
    pub mode: Option<String>,
}

impl RemarkParts {
    pub fn parse(remarks: &str) -> Self {
        if !remarks.contains('|') {
            return Self {
                purpose: non_empty(remarks),
                ..Self::default()
            };
        }

        let mut segments = remarks.splitn(3, '|');
        Self {
            subtype: segments.next().and_then(normalize_label),
            purpose: segments.next().and_then(non_empty),
            mode: segments.next().and_then(non_empty),
        }
    }
}

/// One recorded financial movement as fetched from the finance service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub owner_entity_type: OwnerEntityType,
    /// None for pure misc entries.
    pub owner_entity_id: Option<String>,
    pub transaction_nature: Option<TransactionNature>,
    pub category: String,
    pub source_module: SourceModule,
    /// Whole units. Stored as reported; use [`LedgerEntry::normalized_amount`] for math.
    pub amount: i64,
    pub direction: Direction,
    pub approval_status: ApprovalStatus,
    pub effective_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub transaction_subtype: Option<String>,
    pub remarks: Option<String>,
}

impl LedgerEntry {
    pub fn new(
        id: impl Into<String>,
        owner_entity_type: OwnerEntityType,
        amount: i64,
        direction: Direction,
    ) -> Self {
        Self {
            id: id.into(),
            owner_entity_type,
            owner_entity_id: None,
            transaction_nature: None,
            category: String::new(),
            source_module: SourceModule::Other(String::new()),
            amount,
            direction,
            approval_status: ApprovalStatus::Approved,
            effective_date: None,
            created_at: None,
            title: None,
            transaction_subtype: None,
            remarks: None,
        }
    }

    pub fn with_owner(mut self, owner_entity_id: impl Into<String>) -> Self {
        self.owner_entity_id = Some(owner_entity_id.into());
        self
    }

    pub fn with_nature(mut self, nature: TransactionNature) -> Self {
        self.transaction_nature = Some(nature);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<SourceModule>) -> Self {
        self.source_module = module.into();
        self
    }

    pub fn with_status(mut self, status: ApprovalStatus) -> Self {
        self.approval_status = status;
        self
    }

    pub fn with_effective_date(mut self, date: DateTime<Utc>) -> Self {
        self.effective_date = Some(date);
        self
    }

    pub fn with_created_at(mut self, date: DateTime<Utc>) -> Self {
        self.created_at = Some(date);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.transaction_subtype = Some(subtype.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Amount used for balances and totals. Negative amounts count as zero,
    /// anything above [`MAX_AMOUNT`] counts as `MAX_AMOUNT`.
    pub fn normalized_amount(&self) -> i64 {
        if self.amount < 0 {
            tracing::debug!(id = %self.id, amount = self.amount, "negative amount treated as zero");
            return 0;
        }
        self.amount.min(MAX_AMOUNT)
    }

    /// Ordering key: effective date, else creation time, else the epoch.
    pub fn sort_date(&self) -> DateTime<Utc> {
        self.effective_date
            .or(self.created_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    pub fn remark_parts(&self) -> RemarkParts {
        self.remarks
            .as_deref()
            .map(RemarkParts::parse)
            .unwrap_or_default()
    }

    /// Structured sub-type, falling back to the first remarks segment.
    pub fn subtype(&self) -> Option<String> {
        self.transaction_subtype
            .as_deref()
            .and_then(normalize_label)
            .or_else(|| self.remark_parts().subtype)
    }

    pub fn normalized_category(&self) -> String {
        normalize_label(&self.category).unwrap_or_else(|| UNCATEGORIZED.to_string())
    }

    /// Uppercased title and remarks, the free text inspected by the classifier.
    pub fn search_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        let remarks = self.remarks.as_deref().unwrap_or("");
        format!("{title} {remarks}").to_uppercase()
    }

    pub fn context(&self) -> LedgerContext {
        LedgerContext::of(self)
    }
}

/// Uppercase, trim, and join words with `_`. Empty labels yield None.
pub fn normalize_label(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join("_").replace('-', "_").to_uppercase())
}

fn normalize_token(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
