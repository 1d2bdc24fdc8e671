use fleet_core::LedgerEntry;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// A scalar the finance service may send as text, number or a populated reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Text(String),
    Number(Number),
    Flag(bool),
    /// Populated document such as `{"_id": "...", "name": "..."}`.
    Ref(Map<String, Value>),
}

impl Loose {
    /// Textual form; references yield their `_id`/`id`.
    pub fn text(&self) -> Option<String> {
        match self {
            Loose::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Loose::Number(n) => Some(n.to_string()),
            Loose::Flag(b) => Some(b.to_string()),
            Loose::Ref(map) => ["_id", "id"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
        }
    }

    /// Display name carried by a populated reference.
    pub fn ref_name(&self) -> Option<String> {
        match self {
            Loose::Ref(map) => ["name", "fullName", "label", "registrationNumber"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}

/// Ledger record as emitted by the remote finance/ledger service.
///
/// Field names follow the service. Older payload shapes spell some fields
/// differently, and populated documents often carry several spellings at once
/// (`_id` and `id`, `entry_date` and `date`); the first usable key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRecord {
    pub id: Option<Loose>,
    pub owner_entity_type: Option<Loose>,
    pub owner_entity_id: Option<Loose>,
    pub owner_entity_name: Option<Loose>,
    pub driver_id: Option<Loose>,
    pub client_id: Option<Loose>,
    pub truck_id: Option<Loose>,
    pub transaction_nature: Option<Loose>,
    pub category: Option<Loose>,
    pub source_module: Option<Loose>,
    pub amount: Option<Loose>,
    pub direction: Option<Loose>,
    pub approval_status: Option<Loose>,
    pub effective_date: Option<Loose>,
    pub created_at: Option<Loose>,
    pub title: Option<Loose>,
    pub transaction_subtype: Option<Loose>,
    pub remarks: Option<Loose>,
}

impl RemoteRecord {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| map.get(*key))
                .filter(|value| value.as_str().is_none_or(|s| !s.trim().is_empty()))
                .find_map(|value| serde_json::from_value::<Loose>(value.clone()).ok())
        };

        Self {
            id: pick(&["_id", "id"]),
            owner_entity_type: pick(&["ownerEntityType", "owner_entity_type", "entityType"]),
            owner_entity_id: pick(&["ownerEntityId", "owner_entity_id"]),
            owner_entity_name: pick(&["ownerEntityName", "entityName"]),
            driver_id: pick(&["driverId", "driver"]),
            client_id: pick(&["clientId", "client"]),
            truck_id: pick(&["truckId", "truck"]),
            transaction_nature: pick(&["transaction_nature", "transactionNature", "nature"]),
            category: pick(&["category"]),
            source_module: pick(&["sourceModule", "source_module", "module"]),
            amount: pick(&["amount"]),
            direction: pick(&["direction", "type"]),
            approval_status: pick(&["approvalStatus", "approval_status", "status"]),
            effective_date: pick(&["entry_date", "effectiveDate", "entryDate", "date"]),
            created_at: pick(&["createdAt", "created_at"]),
            title: pick(&["title"]),
            transaction_subtype: pick(&[
                "transactionSubtype",
                "transaction_subtype",
                "subType",
            ]),
            remarks: pick(&["remarks", "notes", "description"]),
        }
    }
}

/// Decoded snapshot ready for the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub entries: Vec<LedgerEntry>,
    /// Display names for owner ids, harvested from populated references.
    pub labels: HashMap<String, String>,
    /// Records that were not JSON objects.
    pub skipped: usize,
}
