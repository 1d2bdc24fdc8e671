//! Deterministic entry classification.
//!
//! Driver-ledger entries are bucketed from their nature and free text; misc,
//! running and maintenance entries keep the category and direction their form set.
//! Classification never fails: anything unrecognized lands in the context's
//! default bucket.

use fleet_core::{Direction, LedgerContext, LedgerEntry, TransactionNature};
use serde::{Deserialize, Serialize};

/// Marker some clients write into title/remarks for owner transfers.
const OWNER_TO_DRIVER_TOKEN: &str = "OWNER_TO_DRIVER";
const VENDOR_TOKEN: &str = "VENDOR";

/// Result of classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifiedType {
    /// Owner handed money to the driver.
    OwnerToDriver,
    /// Driver spent on the trip (fuel, tolls, food...). Default driver bucket.
    DriverSpend,
    /// Driver paid a vendor on the owner's behalf.
    DriverToVendor,
    /// Form-categorized entry from a misc/running/maintenance book.
    Categorized {
        category: String,
        direction: Direction,
    },
}

impl ClassifiedType {
    /// Inbound flow to the tracked party, i.e. a credit.
    pub fn is_inflow(&self) -> bool {
        match self {
            ClassifiedType::OwnerToDriver => true,
            ClassifiedType::Categorized { direction, .. } => *direction == Direction::Income,
            ClassifiedType::DriverSpend | ClassifiedType::DriverToVendor => false,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ClassifiedType::OwnerToDriver => "OWNER_TO_DRIVER",
            ClassifiedType::DriverSpend => "DRIVER_SPEND",
            ClassifiedType::DriverToVendor => "DRIVER_TO_VENDOR",
            ClassifiedType::Categorized { category, .. } => category,
        }
    }
}

/// Classify an entry in the context resolved from its own module and owner.
pub fn classify(entry: &LedgerEntry) -> ClassifiedType {
    classify_in(entry, entry.context())
}

/// Classify an entry under an explicit context.
pub fn classify_in(entry: &LedgerEntry, context: LedgerContext) -> ClassifiedType {
    match context {
        LedgerContext::DriverLedger => classify_driver(entry),
        LedgerContext::Report => ClassifiedType::Categorized {
            category: entry.normalized_category(),
            direction: entry.direction,
        },
    }
}

/// Priority: received nature / owner token > vendor keyword > driver spend.
fn classify_driver(entry: &LedgerEntry) -> ClassifiedType {
    let text = entry.search_text();

    if entry.transaction_nature == Some(TransactionNature::ReceivedByDriver)
        || text.contains(OWNER_TO_DRIVER_TOKEN)
    {
        return ClassifiedType::OwnerToDriver;
    }

    if text.contains(VENDOR_TOKEN) {
        return ClassifiedType::DriverToVendor;
    }

    ClassifiedType::DriverSpend
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::OwnerEntityType;

    fn driver_entry(nature: TransactionNature) -> LedgerEntry {
        LedgerEntry::new("d-1", OwnerEntityType::Driver, 300, nature.implied_direction())
            .with_owner("drv-7")
            .with_module("DRIVER_LEDGER")
            .with_nature(nature)
    }

    #[test]
    fn test_received_nature_is_owner_to_driver() {
        let entry = driver_entry(TransactionNature::ReceivedByDriver);
        assert_eq!(classify(&entry), ClassifiedType::OwnerToDriver);
        assert!(classify(&entry).is_inflow());
    }

    #[test]
    fn test_owner_token_in_title() {
        let entry = driver_entry(TransactionNature::PaidByDriver).with_title("owner_to_driver top-up");
        assert_eq!(classify(&entry), ClassifiedType::OwnerToDriver);
    }

    #[test]
    fn test_vendor_keyword_in_remarks() {
        let entry = driver_entry(TransactionNature::PaidByDriver)
            .with_remarks("SETTLEMENT | Vendor payout | CASH");
        assert_eq!(classify(&entry), ClassifiedType::DriverToVendor);
        assert!(!classify(&entry).is_inflow());
    }

    #[test]
    fn test_missing_remarks_is_driver_spend() {
        let entry = driver_entry(TransactionNature::PaidByDriver);
        assert_eq!(classify(&entry), ClassifiedType::DriverSpend);

        let blank = entry.with_remarks("");
        assert_eq!(classify(&blank), ClassifiedType::DriverSpend);
    }

    #[test]
    fn test_owner_token_wins_over_vendor() {
        let entry = driver_entry(TransactionNature::PaidByDriver)
            .with_remarks("OWNER_TO_DRIVER via vendor account");
        assert_eq!(classify(&entry), ClassifiedType::OwnerToDriver);
    }

    #[test]
    fn test_unknown_nature_defaults_to_spend() {
        let entry = LedgerEntry::new("d-2", OwnerEntityType::Driver, 50, Direction::Expense);
        assert_eq!(classify(&entry), ClassifiedType::DriverSpend);
    }

    #[test]
    fn test_report_context_trusts_form_fields() {
        let entry = LedgerEntry::new("m-1", OwnerEntityType::Misc, 1200, Direction::Income)
            .with_module("MISC")
            .with_category("scrap sale")
            .with_remarks("paid to vendor");
        let classified = classify(&entry);
        assert_eq!(
            classified,
            ClassifiedType::Categorized {
                category: "SCRAP_SALE".to_string(),
                direction: Direction::Income,
            }
        );
        assert!(classified.is_inflow());
        assert_eq!(classified.label(), "SCRAP_SALE");
    }

    #[test]
    fn test_forced_context() {
        let entry = driver_entry(TransactionNature::PaidByDriver).with_category("FUEL");
        assert_eq!(
            classify_in(&entry, LedgerContext::Report),
            ClassifiedType::Categorized {
                category: "FUEL".to_string(),
                direction: Direction::Expense,
            }
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        let entries = [
            driver_entry(TransactionNature::ReceivedByDriver),
            driver_entry(TransactionNature::PaidByDriver).with_remarks("vendor"),
            driver_entry(TransactionNature::Expense),
        ];
        for entry in &entries {
            assert_eq!(classify(entry), classify(entry));
        }
    }
}
