// File-backed key/value store
//
// The whole record is one JSON object on disk. Every operation reads the file in
// full, applies itself, and (for writes) rewrites the file in full. A single
// reader/writer lock serializes writers against everything else, which is what
// makes `update_item` atomic even though it touches the file twice.
//
// Known limitation: the file is rewritten in place. A crash mid-write can leave a
// truncated record behind; nothing here tries to recover from that.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

type Record = BTreeMap<String, String>;

/// Durable string-to-string store backed by a single JSON file
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl ConfigStore {
    /// Wrap an existing (or not yet existing) record file without touching disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Create the parent directory and an empty record if the file is missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);

        if let Some(parent) = store.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !store.path.exists() {
            debug!("Creating empty config record at {}", store.path.display());
            store.write_record(&Record::new())?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`, `None` if the key is absent
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read();
        let mut record = self.read_record()?;
        Ok(record.remove(key))
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let _guard = self.lock.write();
        let mut record = self.read_record_or_empty();
        record.insert(key.to_string(), value.into());
        self.write_record(&record)
    }

    /// Removing an absent key still rewrites the record and succeeds
    pub fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut record = self.read_record_or_empty();
        record.remove(key);
        self.write_record(&record)
    }

    /// Atomic read-modify-write of one key.
    ///
    /// The mutator sees the current value, or `""` when the key is absent. If it
    /// fails, the error is returned and the record is left untouched.
    pub fn update_item<F>(&self, key: &str, mutator: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let _guard = self.lock.write();
        let mut record = self.read_record_or_empty();
        let current = record.get(key).map(String::as_str).unwrap_or("");
        let updated = mutator(current)?;
        record.insert(key.to_string(), updated);
        self.write_record(&record)
    }

    /// Drop every key
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.write();
        self.write_record(&Record::new())
    }

    /// Key at `index` in sorted key order, `None` past the end
    pub fn key(&self, index: usize) -> Result<Option<String>> {
        let _guard = self.lock.read();
        let record = self.read_record()?;
        Ok(record.into_keys().nth(index))
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.read();
        let record = self.read_record()?;
        Ok(record.into_keys().collect())
    }

    // Callers must hold the lock for both helpers below.

    fn read_record(&self) -> Result<Record> {
        let file = File::open(&self.path)?;
        let record = serde_json::from_reader(BufReader::new(file))?;
        Ok(record)
    }

    fn read_record_or_empty(&self) -> Record {
        match self.read_record() {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Config record {} unreadable, starting from empty: {}",
                    self.path.display(),
                    e
                );
                Record::new()
            }
        }
    }

    fn write_record(&self, record: &Record) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
