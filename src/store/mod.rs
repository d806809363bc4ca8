//! Record storage is abstracted through [record_store::RecordStore].
//!  - [record_store::MemoryRecordStore] holds a fixed list, including the built-in sample.
//!  - [json_store::JsonRecordStore] keeps records as JSON lines inside a records directory.
//!  - Stores apply the query date range; all other filtering happens in [crate::query].

pub mod entities;
pub mod json_store;
pub mod record_store;
