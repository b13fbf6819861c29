//! Whole-collection persistence for the filament inventory.
//!
//! Stores never apply partial updates: callers read every record, change
//! what they need, and hand the full collection back.

mod csv_store;
mod memory_store;

pub use csv_store::{CsvStore, CSV_HEADERS};
pub use memory_store::InMemoryStore;

use crate::entity::FilamentRecord;
use crate::error::Result;

/// Backing storage for the ordered record collection.
pub trait RecordStore: Send + Sync {
    /// Read the full collection in stored order.
    fn load_all(&self) -> Result<Vec<FilamentRecord>>;

    /// Replace the full collection and return it as read back from storage.
    fn save_all(&self, records: &[FilamentRecord]) -> Result<Vec<FilamentRecord>>;
}
