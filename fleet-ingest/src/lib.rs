//! fleet-ingest: decoding of finance service ledger payloads into canonical entries.

pub mod types;
pub mod parsers;

pub use types::{ImportBatch, Loose, RemoteRecord};
pub use parsers::finance_api::{
    RecordDecoder, parse_entries_json, read_entries_file, to_entries_json,
};
