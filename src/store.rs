//! Flat JSON-file persistence.
//!
//! Each entity lives in its own file holding a JSON array. The whole file is
//! loaded on open and rewritten on every mutation.

use bevy_log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::{PortfolioError, PortfolioResult};

pub type RecordId = u64;

/// A value with a store-assigned numeric id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human readable entity name, used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
}

/// Storage seam the HTTP handlers are written against.
pub trait Repository<T: Record>: Send + Sync {
    fn list(&self) -> PortfolioResult<Vec<T>>;

    fn get(&self, id: RecordId) -> PortfolioResult<Option<T>>;

    /// Stores the record built for the next free id and returns it.
    fn create(&self, build: &mut dyn FnMut(RecordId) -> T) -> PortfolioResult<T>;

    /// Applies `apply` to the record with `id`. `Ok(None)` when there is no such record.
    fn update(&self, id: RecordId, apply: &mut dyn FnMut(&mut T)) -> PortfolioResult<Option<T>>;

    /// Removes the record with `id`. `Ok(false)` when there was nothing to remove.
    fn delete(&self, id: RecordId) -> PortfolioResult<bool>;
}

#[derive(Debug)]
pub struct JsonFileStore<T> {
    path: Option<PathBuf>,
    records: Mutex<Vec<T>>,
}

impl<T: Record> JsonFileStore<T> {
    /// Loads `path` if it exists, otherwise starts empty. A file that exists but
    /// does not parse is an error.
    pub fn open(path: impl Into<PathBuf>) -> PortfolioResult<Self> {
        let path = path.into();
        let records = Self::load(&path)?.unwrap_or_default();
        info!(
            "Loaded {} {} record(s) from {}",
            records.len(),
            T::KIND,
            path.display()
        );
        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// Like [`JsonFileStore::open`], but writes `seed` when the file is missing.
    pub fn open_or_seed(path: impl Into<PathBuf>, seed: Vec<T>) -> PortfolioResult<Self> {
        let path = path.into();
        match Self::load(&path)? {
            Some(records) => Ok(Self {
                path: Some(path),
                records: Mutex::new(records),
            }),
            None => {
                info!(
                    "{} not found, seeding {} default {} record(s)",
                    path.display(),
                    seed.len(),
                    T::KIND
                );
                Self::save(&path, &seed)?;
                Ok(Self {
                    path: Some(path),
                    records: Mutex::new(seed),
                })
            }
        }
    }

    /// Store without a backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(path: &Path) -> PortfolioResult<Option<Vec<T>>> {
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path)
            .map_err(|e| PortfolioError::io_error(format!("read {}", path.display()), e))?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PortfolioError::storage(path.display().to_string(), e))
    }

    fn save(path: &Path, records: &[T]) -> PortfolioResult<()> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| PortfolioError::storage(path.display().to_string(), e))?;
        fs::write(path, bytes)
            .map_err(|e| PortfolioError::io_error(format!("write {}", path.display()), e))?;
        debug!("Saved {} {} record(s) to {}", records.len(), T::KIND, path.display());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock leaves the list intact, it is only ever
        // replaced wholesale after a successful write.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persists `next` and, once that succeeded, makes it the current state.
    fn commit(&self, current: &mut Vec<T>, next: Vec<T>) -> PortfolioResult<()> {
        if let Some(path) = &self.path {
            Self::save(path, &next)?;
        }
        *current = next;
        Ok(())
    }
}

impl<T: Record> Repository<T> for JsonFileStore<T> {
    fn list(&self) -> PortfolioResult<Vec<T>> {
        Ok(self.lock().clone())
    }

    fn get(&self, id: RecordId) -> PortfolioResult<Option<T>> {
        Ok(self.lock().iter().find(|record| record.id() == id).cloned())
    }

    fn create(&self, build: &mut dyn FnMut(RecordId) -> T) -> PortfolioResult<T> {
        let mut records = self.lock();
        let id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        let record = build(id);

        let mut next = records.clone();
        next.push(record.clone());
        self.commit(&mut records, next)?;
        Ok(record)
    }

    fn update(&self, id: RecordId, apply: &mut dyn FnMut(&mut T)) -> PortfolioResult<Option<T>> {
        let mut records = self.lock();
        let Some(index) = records.iter().position(|record| record.id() == id) else {
            return Ok(None);
        };

        let mut next = records.clone();
        apply(&mut next[index]);
        let updated = next[index].clone();
        self.commit(&mut records, next)?;
        Ok(Some(updated))
    }

    fn delete(&self, id: RecordId) -> PortfolioResult<bool> {
        let mut records = self.lock();
        let mut next = records.clone();
        next.retain(|record| record.id() != id);
        let removed = next.len() != records.len();

        // Deleting an unknown id still rewrites the file.
        self.commit(&mut records, next)?;
        Ok(removed)
    }
}
