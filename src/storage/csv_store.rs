use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::RecordStore;
use crate::entity::{FilamentRecord, MAX_REMAINING};
use crate::error::{Result, SpooldexError};

/// Column layout of the inventory file, in order.
pub const CSV_HEADERS: [&str; 5] = ["color", "company", "type", "remaining", "color_hex"];

/// Inventory kept in a single CSV file.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<FilamentRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = reader.headers().map_err(|e| self.read_error(e))?.clone();
        if headers.iter().ne(CSV_HEADERS.iter().copied()) {
            return Err(SpooldexError::DataCorruption(format!(
                "{}: expected columns [{}], found [{}]",
                self.path.display(),
                CSV_HEADERS.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<FilamentRecord>().enumerate() {
            let record = result.map_err(|e| self.read_error(e))?;
            // Header is line 1, so data rows start at line 2.
            self.check_row(&record, row + 2)?;
            records.push(record);
        }

        Ok(records)
    }

    fn check_row(&self, record: &FilamentRecord, line: usize) -> Result<()> {
        let corrupt = |what: &str| {
            SpooldexError::DataCorruption(format!(
                "{} line {}: {}",
                self.path.display(),
                line,
                what
            ))
        };

        if record.color.trim().is_empty() {
            return Err(corrupt("empty color"));
        }
        if record.company.trim().is_empty() {
            return Err(corrupt("empty company"));
        }
        if record.kind.trim().is_empty() {
            return Err(corrupt("empty type"));
        }
        if record.remaining > MAX_REMAINING {
            return Err(corrupt(&format!(
                "remaining {} is out of range 0..={}",
                record.remaining, MAX_REMAINING
            )));
        }
        Ok(())
    }

    fn read_error(&self, err: csv::Error) -> SpooldexError {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io) = err.into_kind() {
                return SpooldexError::Io(io);
            }
            return SpooldexError::DataCorruption(format!("{}: unreadable", self.path.display()));
        }
        SpooldexError::DataCorruption(format!("{}: {}", self.path.display(), err))
    }

    fn encode(records: &[FilamentRecord]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADERS).map_err(encode_error)?;
        for record in records {
            writer.serialize(record).map_err(encode_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| SpooldexError::Io(e.into_error()))
    }

    /// Write the full file next to its destination, then rename over it.
    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| SpooldexError::Io(e.error))?;

        Ok(())
    }
}

fn encode_error(err: csv::Error) -> SpooldexError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => SpooldexError::Io(io),
        other => SpooldexError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

impl RecordStore for CsvStore {
    fn load_all(&self) -> Result<Vec<FilamentRecord>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "inventory file missing, seeding defaults");
            return self.save_all(&FilamentRecord::seed());
        }

        let records = self.read_records().inspect_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to load inventory");
        })?;
        debug!(count = records.len(), "loaded inventory");
        Ok(records)
    }

    fn save_all(&self, records: &[FilamentRecord]) -> Result<Vec<FilamentRecord>> {
        let bytes = Self::encode(records)?;
        self.write_atomic(&bytes)?;
        debug!(count = records.len(), path = %self.path.display(), "saved inventory");

        self.read_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ColorHex;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> CsvStore {
        CsvStore::new(tmp.path().join("filaments.csv"))
    }

    #[test]
    fn test_first_load_seeds_and_persists() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let records = store.load_all().unwrap();

        assert!(store.path().exists());
        let colors: Vec<_> = records.iter().map(|r| r.color.as_str()).collect();
        assert_eq!(colors, vec!["Army Green", "Fluorescent Green", "Ruby Red"]);
        assert_eq!(records[0].color_hex.as_str(), "#4B5320");
        assert_eq!(records[1].color_hex.as_str(), "#39FF14");
        assert_eq!(records[2].color_hex.as_str(), "#E0115F");
        assert!(records.iter().all(|r| r.company == "Creality" && r.kind == "PLA"));
        assert!(records.iter().all(|r| r.remaining == 50));
    }

    #[test]
    fn test_file_layout() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.load_all().unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("color,company,type,remaining,color_hex"));
        assert_eq!(lines.next(), Some("Army Green,Creality,PLA,50,#4B5320"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_save_returns_reloaded_records() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let mut records = store.load_all().unwrap();
        records.push(FilamentRecord::new(
            "Jet, \"Black\"",
            "Prusament",
            "PETG",
            80,
            "#0b0b0b".parse().unwrap(),
        ));

        let saved = store.save_all(&records).unwrap();
        assert_eq!(saved, records);
        assert_eq!(store.load_all().unwrap(), records);
    }

    #[test]
    fn test_save_empty_collection_keeps_header() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let saved = store.save_all(&[]).unwrap();
        assert!(saved.is_empty());
        assert!(store.load_all().unwrap().is_empty());

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim_end(), "color,company,type,remaining,color_hex");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = CsvStore::new(tmp.path().join("data/nested/filaments.csv"));

        store
            .save_all(&[FilamentRecord::new("White", "eSun", "PLA", 10, ColorHex::default())])
            .unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_columns_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(store.path(), "color,company,remaining\nRed,Creality,50\n").unwrap();

        let result = store.load_all();
        assert!(matches!(result, Err(SpooldexError::DataCorruption(_))));
    }

    #[test]
    fn test_unparsable_remaining_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(
            store.path(),
            "color,company,type,remaining,color_hex\nRed,Creality,PLA,half,#FF0000\n",
        )
        .unwrap();

        let result = store.load_all();
        assert!(matches!(result, Err(SpooldexError::DataCorruption(_))));
    }

    #[test]
    fn test_out_of_range_remaining_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(
            store.path(),
            "color,company,type,remaining,color_hex\nRed,Creality,PLA,150,#FF0000\n",
        )
        .unwrap();

        match store.load_all() {
            Err(SpooldexError::DataCorruption(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected corruption, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_hex_and_short_rows_are_corruption() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        fs::write(
            store.path(),
            "color,company,type,remaining,color_hex\nRed,Creality,PLA,50,crimson\n",
        )
        .unwrap();
        assert!(matches!(store.load_all(), Err(SpooldexError::DataCorruption(_))));

        fs::write(
            store.path(),
            "color,company,type,remaining,color_hex\nRed,Creality,PLA\n",
        )
        .unwrap();
        assert!(matches!(store.load_all(), Err(SpooldexError::DataCorruption(_))));
    }

    #[test]
    fn test_corrupt_file_is_left_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let garbage = "not,a,filament,file\n1,2,3,4\n";
        fs::write(store.path(), garbage).unwrap();

        assert!(store.load_all().is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), garbage);
    }
}
