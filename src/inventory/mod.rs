//! Add, update and delete operations over the stored inventory.
//!
//! Every operation is a full read-modify-write cycle: load the whole
//! collection, apply one change, save the whole collection. A process-wide
//! lock keeps cycles from interleaving; writers in other processes still
//! race with last-writer-wins.

use std::sync::Mutex;

use tracing::info;

use crate::entity::{FilamentDraft, FilamentRecord};
use crate::error::{Result, SpooldexError};
use crate::storage::RecordStore;

pub struct InventoryService {
    store: Box<dyn RecordStore>,
    write_lock: Mutex<()>,
}

impl InventoryService {
    pub fn new(store: impl RecordStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            write_lock: Mutex::new(()),
        }
    }

    /// Current records in stored order.
    pub fn records(&self) -> Result<Vec<FilamentRecord>> {
        self.store.load_all()
    }

    /// Append a new record. Returns the collection as persisted.
    pub fn add_record(&self, draft: &FilamentDraft) -> Result<Vec<FilamentRecord>> {
        let record = draft.validate()?;
        self.mutate(|records| {
            info!(color = %record.color, company = %record.company, "adding filament");
            records.push(record);
            Ok(())
        })
    }

    /// Overwrite every field of the record at `index`.
    pub fn update_record(&self, index: usize, draft: &FilamentDraft) -> Result<Vec<FilamentRecord>> {
        let record = draft.validate()?;
        self.mutate(|records| {
            let slot = slot_mut(records, index)?;
            info!(index, color = %record.color, "updating filament");
            *slot = record;
            Ok(())
        })
    }

    /// Remove the record at `index`, shifting later records down by one.
    pub fn delete_record(&self, index: usize) -> Result<Vec<FilamentRecord>> {
        self.mutate(|records| {
            check_bounds(records, index)?;
            let removed = records.remove(index);
            info!(index, color = %removed.color, "deleted filament");
            Ok(())
        })
    }

    /// Like [`update_record`](Self::update_record), but refuses to apply when
    /// the record at `index` is no longer `expected`.
    pub fn update_record_checked(
        &self,
        index: usize,
        expected: &FilamentRecord,
        draft: &FilamentDraft,
    ) -> Result<Vec<FilamentRecord>> {
        let record = draft.validate()?;
        self.mutate(|records| {
            let slot = slot_mut(records, index)?;
            if slot != expected {
                return Err(SpooldexError::StaleRecord { index });
            }
            info!(index, color = %record.color, "updating filament");
            *slot = record;
            Ok(())
        })
    }

    /// Like [`delete_record`](Self::delete_record), but refuses to apply when
    /// the record at `index` is no longer `expected`.
    pub fn delete_record_checked(
        &self,
        index: usize,
        expected: &FilamentRecord,
    ) -> Result<Vec<FilamentRecord>> {
        self.mutate(|records| {
            check_bounds(records, index)?;
            if &records[index] != expected {
                return Err(SpooldexError::StaleRecord { index });
            }
            let removed = records.remove(index);
            info!(index, color = %removed.color, "deleted filament");
            Ok(())
        })
    }

    fn mutate<F>(&self, apply: F) -> Result<Vec<FilamentRecord>>
    where
        F: FnOnce(&mut Vec<FilamentRecord>) -> Result<()>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.store.load_all()?;
        apply(&mut records)?;
        self.store.save_all(&records)
    }
}

fn check_bounds(records: &[FilamentRecord], index: usize) -> Result<()> {
    if index >= records.len() {
        return Err(SpooldexError::IndexOutOfRange {
            index,
            len: records.len(),
        });
    }
    Ok(())
}

fn slot_mut(records: &mut [FilamentRecord], index: usize) -> Result<&mut FilamentRecord> {
    let len = records.len();
    records
        .get_mut(index)
        .ok_or(SpooldexError::IndexOutOfRange { index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CsvStore, InMemoryStore};
    use tempfile::TempDir;

    fn jet_black() -> FilamentDraft {
        FilamentDraft::new("Jet Black", "Prusament", "PETG", 80, "#0B0B0B")
    }

    fn colors(records: &[FilamentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.color.as_str()).collect()
    }

    #[test]
    fn test_add_appends_at_end() {
        let service = InventoryService::new(InMemoryStore::seeded());

        let records = service.add_record(&jet_black()).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[3], jet_black().validate().unwrap());
        assert_eq!(service.records().unwrap(), records);
    }

    #[test]
    fn test_add_rejects_missing_fields_without_mutation() {
        let service = InventoryService::new(InMemoryStore::seeded());
        let draft = FilamentDraft::new("Jet Black", "", "PETG", 80, "#0B0B0B");

        let result = service.add_record(&draft);

        assert!(matches!(
            result,
            Err(SpooldexError::Validation { field: "Company" })
        ));
        assert_eq!(service.records().unwrap().len(), 3);
    }

    #[test]
    fn test_update_changes_only_target() {
        let service = InventoryService::new(InMemoryStore::seeded());
        let before = service.records().unwrap();

        let after = service.update_record(1, &jet_black()).unwrap();

        assert_eq!(after.len(), before.len());
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], jet_black().validate().unwrap());
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn test_update_out_of_bounds() {
        let service = InventoryService::new(InMemoryStore::seeded());

        let result = service.update_record(3, &jet_black());

        assert!(matches!(
            result,
            Err(SpooldexError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(service.records().unwrap(), FilamentRecord::seed());
    }

    #[test]
    fn test_update_validates_before_bounds() {
        let service = InventoryService::new(InMemoryStore::seeded());
        let draft = FilamentDraft::new("", "Prusament", "PETG", 80, "#0B0B0B");

        let result = service.update_record(99, &draft);
        assert!(matches!(result, Err(SpooldexError::Validation { .. })));
    }

    #[test]
    fn test_delete_shifts_tail() {
        let service = InventoryService::new(InMemoryStore::seeded());

        let records = service.delete_record(1).unwrap();

        assert_eq!(colors(&records), vec!["Army Green", "Ruby Red"]);
        assert_eq!(records[1], FilamentRecord::seed()[2]);
    }

    #[test]
    fn test_delete_out_of_bounds() {
        let service = InventoryService::new(InMemoryStore::default());
        assert!(matches!(
            service.delete_record(0),
            Err(SpooldexError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_checked_operations_detect_stale_selection() {
        let service = InventoryService::new(InMemoryStore::seeded());
        let seen = service.records().unwrap()[1].clone();

        // Someone else removes the first record, shifting everything up.
        service.delete_record(0).unwrap();

        assert!(matches!(
            service.update_record_checked(1, &seen, &jet_black()),
            Err(SpooldexError::StaleRecord { index: 1 })
        ));
        assert!(matches!(
            service.delete_record_checked(1, &seen),
            Err(SpooldexError::StaleRecord { index: 1 })
        ));
        assert_eq!(colors(&service.records().unwrap()), vec!["Fluorescent Green", "Ruby Red"]);

        let current = service.records().unwrap()[0].clone();
        let records = service.delete_record_checked(0, &current).unwrap();
        assert_eq!(colors(&records), vec!["Ruby Red"]);
    }

    #[test]
    fn test_operations_persist_through_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("filaments.csv");
        let service = InventoryService::new(CsvStore::new(&path));

        service.add_record(&jet_black()).unwrap();
        service.delete_record(0).unwrap();

        let reopened = InventoryService::new(CsvStore::new(&path));
        let records = reopened.records().unwrap();
        assert_eq!(
            colors(&records),
            vec!["Fluorescent Green", "Ruby Red", "Jet Black"]
        );
        assert_eq!(records[2].color_hex.as_str(), "#0B0B0B");
    }
}
