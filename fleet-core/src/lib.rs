//! fleet-core: ledger entry model and approval lifecycle for the fleet finance engine

pub mod approval;
pub mod ledger;
pub mod time;

pub use approval::{
    ApprovalAction, ApprovalError, ApprovalStatus, apply_action, initial_status, requires_approval,
};
pub use ledger::{
    Direction, LedgerContext, LedgerEntry, OwnerEntityType, RemarkParts, SourceModule,
    MAX_AMOUNT, TransactionNature, UNCATEGORIZED, normalize_label,
};
pub use time::parse_effective_date;
