//! # DataStore Module
//!
//! This module provides persistence for summary batches: one directory per
//! batch holding a text file per video summary plus a `metadata.json` index.
//!
//! A batch without an index is an incomplete run (crashed or still in
//! progress). Batches are append-only until the index is written and are never
//! deleted here.

mod datastore;
mod domain;
mod error;

pub use datastore::fs::FsBatchStore;
pub use datastore::{validate_component, BatchStore};
pub use domain::{
    batch_created_at, summary_filename, BatchIndex, BatchListing, SummaryRecord, SummaryStatus,
    BATCH_ID_FORMAT,
};
pub use error::StoreError;
