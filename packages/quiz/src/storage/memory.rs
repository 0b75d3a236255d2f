use std::collections::HashMap;

use parking_lot::Mutex;

use super::{KeyValueStore, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Availability {
    #[default]
    Available,
    ReadOnly,
    Unavailable,
}

/// In-memory store. Can be switched into failure modes to simulate quota
/// errors or disabled storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    availability: Mutex<Availability>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read and write fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.availability.lock() = if unavailable {
            Availability::Unavailable
        } else {
            Availability::Available
        };
    }

    /// Writes fail while set; reads still succeed.
    pub fn set_read_only(&self, read_only: bool) {
        *self.availability.lock() = if read_only {
            Availability::ReadOnly
        } else {
            Availability::Available
        };
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn check_read(&self) -> StorageResult<()> {
        match *self.availability.lock() {
            Availability::Unavailable => {
                Err(StorageError::Unavailable("storage disabled".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_write(&self) -> StorageResult<()> {
        match *self.availability.lock() {
            Availability::Available => Ok(()),
            Availability::ReadOnly => Err(StorageError::Unavailable("quota exceeded".to_string())),
            Availability::Unavailable => {
                Err(StorageError::Unavailable("storage disabled".to_string()))
            }
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_read()?;
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_write()?;
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.check_write()?;
        self.items.lock().remove(key);
        Ok(())
    }
}
