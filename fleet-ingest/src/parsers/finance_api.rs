//! Finance service payload decoder.
//!
//! Accepts either a bare JSON array of ledger records or an envelope object
//! carrying the array under `data` or `entries`:
//!
//!   [{"_id": "65f...", "driverId": "drv-1", "transaction_nature": "paid_by_driver",
//!     "amount": "₹1,250.00", "entry_date": "2025-04-02", "remarks": "FUEL | Pune | UPI"}]
//!
//! Records are normalized rather than rejected: bad dates become None, amounts
//! are parsed leniently, and missing enums fall back to what the rest of the
//! record implies.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use fleet_core::{
    ApprovalStatus, Direction, LedgerEntry, MAX_AMOUNT, OwnerEntityType, SourceModule,
    TransactionNature, initial_status, parse_effective_date, time::from_epoch_millis,
};
use regex::Regex;
use serde_json::Value;
use std::path::Path;

use crate::types::{ImportBatch, Loose, RemoteRecord};

/// Decode a finance service payload into canonical entries.
pub fn parse_entries_json(text: &str) -> Result<ImportBatch> {
    let decoder = RecordDecoder::new()?;
    let payload: Value = serde_json::from_str(text).context("payload is not valid JSON")?;
    let records = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope
            .remove("data")
            .or_else(|| envelope.remove("entries"))
        {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("envelope `data`/`entries` is not an array"),
            None => bail!("payload object has no `data` or `entries` array"),
        },
        _ => bail!("payload must be an array of ledger records"),
    };

    let mut batch = ImportBatch::default();
    for (index, value) in records.iter().enumerate() {
        let Some(map) = value.as_object() else {
            tracing::warn!(index, "skipping ledger record that is not an object");
            batch.skipped += 1;
            continue;
        };
        let record = RemoteRecord::from_map(map);

        if let Some((id, name)) = owner_label(&record) {
            batch.labels.entry(id).or_insert(name);
        }
        batch.entries.push(decoder.to_entry(record, index));
    }

    tracing::debug!(
        entries = batch.entries.len(),
        skipped = batch.skipped,
        "decoded ledger payload"
    );
    Ok(batch)
}

/// Read and decode a snapshot file.
pub fn read_entries_file(path: impl AsRef<Path>) -> Result<ImportBatch> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_entries_json(&text).with_context(|| format!("decoding {}", path.display()))
}

/// Serialize canonical entries; [`parse_entries_json`] reads the output back.
pub fn to_entries_json(entries: &[LedgerEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).context("serializing ledger entries")
}

/// Maps remote records onto [`LedgerEntry`], filling gaps from the rest of the record.
pub struct RecordDecoder {
    amount_re: Regex,
}

impl RecordDecoder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            amount_re: Regex::new(r"-?\d[\d,]*(?:\.\d+)?")?,
        })
    }

    pub fn to_entry(&self, record: RemoteRecord, index: usize) -> LedgerEntry {
        let text = |field: &Option<Loose>| field.as_ref().and_then(Loose::text);

        let id = text(&record.id).unwrap_or_else(|| format!("row-{index}"));
        let owner_entity_type = text(&record.owner_entity_type)
            .and_then(|raw| OwnerEntityType::parse(&raw))
            .unwrap_or_else(|| infer_owner_type(&record));
        let owner_entity_id = text(&record.owner_entity_id).or_else(|| match owner_entity_type {
            OwnerEntityType::Driver => text(&record.driver_id),
            OwnerEntityType::Client => text(&record.client_id),
            OwnerEntityType::Truck => text(&record.truck_id),
            OwnerEntityType::Misc => None,
        });

        let transaction_nature =
            text(&record.transaction_nature).and_then(|raw| TransactionNature::parse(&raw));
        let direction = text(&record.direction)
            .and_then(|raw| Direction::parse(&raw))
            .or_else(|| transaction_nature.map(|n| n.implied_direction()))
            .unwrap_or(Direction::Expense);

        let mut entry = LedgerEntry {
            id,
            owner_entity_type,
            owner_entity_id,
            transaction_nature,
            category: text(&record.category).unwrap_or_default(),
            source_module: SourceModule::from(text(&record.source_module).unwrap_or_default()),
            amount: record.amount.as_ref().map_or(0, |raw| self.parse_amount(raw)),
            direction,
            approval_status: ApprovalStatus::Approved,
            effective_date: record.effective_date.as_ref().and_then(parse_date),
            created_at: record.created_at.as_ref().and_then(parse_date),
            title: text(&record.title),
            transaction_subtype: text(&record.transaction_subtype),
            remarks: text(&record.remarks),
        };

        entry.approval_status = text(&record.approval_status)
            .and_then(|raw| ApprovalStatus::parse(&raw))
            .unwrap_or_else(|| initial_status(&entry));

        if entry.effective_date.is_none() && entry.created_at.is_none() {
            tracing::debug!(id = %entry.id, "ledger record has no usable date");
        }
        entry
    }

    /// Whole-unit amount from a number or a string such as "₹1,250.50" or "Rs. 500".
    /// Fractions round half away from zero; magnitudes clamp to [`MAX_AMOUNT`];
    /// garbage is 0.
    pub fn parse_amount(&self, raw: &Loose) -> i64 {
        let value = match raw {
            Loose::Number(n) => n.as_f64(),
            Loose::Text(s) => self
                .amount_re
                .find(s)
                .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok()),
            Loose::Flag(_) | Loose::Ref(_) => None,
        };
        match value {
            Some(v) if v.is_finite() => {
                let limit = MAX_AMOUNT as f64;
                if v.abs() > limit {
                    tracing::warn!(?raw, "amount out of range, clamped");
                }
                v.clamp(-limit, limit).round() as i64
            }
            _ => {
                tracing::debug!(?raw, "unparseable amount treated as zero");
                0
            }
        }
    }
}

fn infer_owner_type(record: &RemoteRecord) -> OwnerEntityType {
    if record.driver_id.is_some() {
        OwnerEntityType::Driver
    } else if record.truck_id.is_some() {
        OwnerEntityType::Truck
    } else if record.client_id.is_some() {
        OwnerEntityType::Client
    } else {
        OwnerEntityType::Misc
    }
}

fn owner_label(record: &RemoteRecord) -> Option<(String, String)> {
    if let Some(name) = record.owner_entity_name.as_ref().and_then(Loose::text) {
        let id = record
            .owner_entity_id
            .as_ref()
            .or(record.driver_id.as_ref())
            .or(record.client_id.as_ref())
            .or(record.truck_id.as_ref())
            .and_then(Loose::text)?;
        return Some((id, name));
    }

    [&record.driver_id, &record.client_id, &record.truck_id]
        .into_iter()
        .flatten()
        .find_map(|r| Some((r.text()?, r.ref_name()?)))
}

fn parse_date(raw: &Loose) -> Option<DateTime<Utc>> {
    match raw {
        Loose::Text(s) => parse_effective_date(s),
        Loose::Number(n) => n.as_i64().and_then(from_epoch_millis),
        Loose::Flag(_) => None,
        Loose::Ref(map) => map
            .get("$date")
            .and_then(Value::as_str)
            .and_then(parse_effective_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Number;

    #[test]
    fn test_parses_remote_driver_rows() {
        let text = r#"[
            {"_id": "e1", "driverId": "drv-1", "transaction_nature": "received_by_driver",
             "amount": 1000, "entry_date": "2025-04-01", "sourceModule": "DRIVER_LEDGER"},
            {"_id": "e2", "driverId": "drv-1", "transaction_nature": "paid_by_driver",
             "amount": "₹1,250.50", "entry_date": "2025-04-02T09:30:00Z",
             "remarks": "FUEL | Pune pump | UPI"}
        ]"#;
        let batch = parse_entries_json(text).unwrap();
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.skipped, 0);

        let first = &batch.entries[0];
        assert_eq!(first.owner_entity_type, OwnerEntityType::Driver);
        assert_eq!(first.owner_entity_id.as_deref(), Some("drv-1"));
        assert_eq!(first.direction, Direction::Income);
        assert_eq!(first.amount, 1000);
        assert_eq!(
            first.effective_date,
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
        );

        let second = &batch.entries[1];
        assert_eq!(second.amount, 1251);
        assert_eq!(second.direction, Direction::Expense);
        assert_eq!(second.approval_status, ApprovalStatus::Approved);
        assert_eq!(second.subtype().as_deref(), Some("FUEL"));
    }

    #[test]
    fn test_envelope_and_defaults() {
        let text = r#"{"data": [
            {"amount": 500, "category": "Office Expense", "type": "expense", "sourceModule": "MISC"},
            42,
            {"id": "adv-1", "ownerEntityType": "driver", "ownerEntityId": "drv-2",
             "amount": 2000, "transactionSubtype": "advance", "sourceModule": "DRIVER_LEDGER"}
        ]}"#;
        let batch = parse_entries_json(text).unwrap();
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.skipped, 1);

        let misc = &batch.entries[0];
        assert_eq!(misc.id, "row-0");
        assert_eq!(misc.owner_entity_type, OwnerEntityType::Misc);
        assert_eq!(misc.owner_entity_id, None);
        assert_eq!(misc.source_module, SourceModule::Misc);
        assert_eq!(misc.normalized_category(), "OFFICE_EXPENSE");

        let advance = &batch.entries[1];
        assert_eq!(advance.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_explicit_status_wins() {
        let text = r#"[{"id": "adv-1", "driverId": "drv-2", "amount": 2000,
            "transactionSubtype": "ADVANCE", "approvalStatus": "approved"}]"#;
        let batch = parse_entries_json(text).unwrap();
        assert_eq!(batch.entries[0].approval_status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_populated_refs_give_labels() {
        let text = r#"[{"id": "t1", "truckId": {"_id": "trk-9", "registrationNumber": "MH12AB1234"},
            "amount": 800, "type": "EXPENSE", "sourceModule": "MAINTENANCE",
            "createdAt": 1743552000000}]"#;
        let batch = parse_entries_json(text).unwrap();
        let entry = &batch.entries[0];
        assert_eq!(entry.owner_entity_type, OwnerEntityType::Truck);
        assert_eq!(entry.owner_entity_id.as_deref(), Some("trk-9"));
        assert_eq!(
            entry.created_at,
            Some(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(batch.labels.get("trk-9").map(String::as_str), Some("MH12AB1234"));
    }

    #[test]
    fn test_malformed_fields_are_normalized() {
        let text = r#"[{"id": "x", "amount": "n/a", "entry_date": "sometime", "clientId": 77}]"#;
        let batch = parse_entries_json(text).unwrap();
        let entry = &batch.entries[0];
        assert_eq!(entry.amount, 0);
        assert_eq!(entry.effective_date, None);
        assert_eq!(entry.owner_entity_type, OwnerEntityType::Client);
        assert_eq!(entry.owner_entity_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_rejects_non_array_payloads() {
        assert!(parse_entries_json("not json").is_err());
        assert!(parse_entries_json(r#"{"count": 3}"#).is_err());
        assert!(parse_entries_json("12").is_err());
        assert!(parse_entries_json("[]").unwrap().entries.is_empty());
    }

    #[test]
    fn test_canonical_output_reads_back() {
        let entries = vec![
            LedgerEntry::new("e1", OwnerEntityType::Driver, 450, Direction::Expense)
                .with_owner("drv-1")
                .with_nature(TransactionNature::PaidByDriver)
                .with_module("DRIVER_LEDGER")
                .with_status(ApprovalStatus::Rejected)
                .with_effective_date(Utc.with_ymd_and_hms(2025, 4, 3, 6, 0, 0).unwrap())
                .with_remarks("SETTLEMENT | vendor | CASH"),
        ];
        let json = to_entries_json(&entries).unwrap();
        let batch = parse_entries_json(&json).unwrap();
        assert_eq!(batch.entries, entries);
    }

    #[test]
    fn test_parse_amount_shapes() {
        let decoder = RecordDecoder::new().unwrap();
        assert_eq!(decoder.parse_amount(&Loose::Text("1,200".into())), 1200);
        assert_eq!(decoder.parse_amount(&Loose::Text("-45.5".into())), -46);
        assert_eq!(decoder.parse_amount(&Loose::Number(Number::from(12))), 12);
        assert_eq!(decoder.parse_amount(&Loose::Flag(true)), 0);
    }

    #[test]
    fn test_parse_amount_currency_prefixes() {
        let decoder = RecordDecoder::new().unwrap();
        assert_eq!(decoder.parse_amount(&Loose::Text("Rs. 500".into())), 500);
        assert_eq!(decoder.parse_amount(&Loose::Text("Rs.1,200".into())), 1200);
        assert_eq!(decoder.parse_amount(&Loose::Text("INR 1,250.50".into())), 1251);
        assert_eq!(decoder.parse_amount(&Loose::Text("₹ -75".into())), -75);
        assert_eq!(decoder.parse_amount(&Loose::Text("n/a".into())), 0);
    }

    #[test]
    fn test_parse_amount_clamps_huge_values() {
        let decoder = RecordDecoder::new().unwrap();
        let huge = Number::from_f64(1e19).unwrap();
        assert_eq!(decoder.parse_amount(&Loose::Number(huge)), MAX_AMOUNT);
        let text = Loose::Text("-99999999999999999999".into());
        assert_eq!(decoder.parse_amount(&text), -MAX_AMOUNT);
    }

    #[test]
    fn test_duplicate_spellings_keep_the_record() {
        let text = r#"[
            {"_id": "65f1", "id": "65f1", "driverId": "drv-1", "amount": 500,
             "entry_date": "2025-04-02", "date": "2025-04-03",
             "status": "PENDING", "approvalStatus": "APPROVED"},
            {"_id": null, "id": "e2", "entry_date": "", "date": "2025-04-05", "amount": 10}
        ]"#;
        let batch = parse_entries_json(text).unwrap();
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.entries.len(), 2);

        let first = &batch.entries[0];
        assert_eq!(first.id, "65f1");
        assert_eq!(first.amount, 500);
        assert_eq!(
            first.effective_date,
            Some(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(first.approval_status, ApprovalStatus::Approved);

        let second = &batch.entries[1];
        assert_eq!(second.id, "e2");
        assert_eq!(
            second.effective_date,
            Some(Utc.with_ymd_and_hms(2025, 4, 5, 0, 0, 0).unwrap())
        );
    }
}
