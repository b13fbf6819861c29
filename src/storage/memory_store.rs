use std::sync::Mutex;

use super::RecordStore;
use crate::entity::FilamentRecord;
use crate::error::Result;

/// Volatile store, used by tests and for throwaway instances.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<FilamentRecord>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<FilamentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// A store holding the default seed records.
    pub fn seeded() -> Self {
        Self::new(FilamentRecord::seed())
    }
}

impl RecordStore for InMemoryStore {
    fn load_all(&self) -> Result<Vec<FilamentRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.clone())
    }

    fn save_all(&self, records: &[FilamentRecord]) -> Result<Vec<FilamentRecord>> {
        let mut stored = self.records.lock().unwrap_or_else(|e| e.into_inner());
        *stored = records.to_vec();
        Ok(stored.clone())
    }
}
