//! Collaborator contracts the core depends on, plus bundled implementations.

pub mod file;
pub mod memory;

use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::{AttendanceRecord, DeviceBinding};

pub use file::{JsonBindingStore, JsonLinesRecordStore};
pub use memory::{MemoryBindingStore, MemoryRecordStore};

/// Key-value persistence for device bindings, keyed by employee id.
///
/// Implementations must make a completed `put`/`delete` visible to every
/// later read, and must never expose a partially written binding.
pub trait BindingStore: Send + Sync {
    fn get(&self, employee_id: &str) -> Result<Option<DeviceBinding>, StoreError>;

    /// Inserts or overwrites the binding for `binding.employee_id`.
    fn put(&self, binding: DeviceBinding) -> Result<(), StoreError>;

    /// Returns whether a binding was removed.
    fn delete(&self, employee_id: &str) -> Result<bool, StoreError>;

    /// All bindings in store order.
    fn scan(&self) -> Result<Vec<DeviceBinding>, StoreError>;

    /// First employee, in store order, bound to `device_id`.
    fn find_by_device(&self, device_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .scan()?
            .into_iter()
            .find(|b| b.device_id == device_id)
            .map(|b| b.employee_id))
    }
}

/// Append-only sink for admitted records. A record must be visible to
/// [`RecordSource::records`] by the time `append` returns `Ok`.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &AttendanceRecord) -> Result<(), StoreError>;
}

/// Read side used by the report queries.
pub trait RecordSource: Send + Sync {
    fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError>;
}

/// Out-of-band provisioned registration keys. Read-only.
pub trait KeySource: Send + Sync {
    fn registration_key(&self, employee_id: &str) -> Option<String>;
}

/// Keys loaded once at startup.
#[derive(Default, Clone)]
pub struct StaticKeySource {
    keys: HashMap<String, String>,
}

impl StaticKeySource {
    pub fn new(keys: HashMap<String, String>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticKeySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl std::fmt::Debug for StaticKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeySource")
            .field("employees", &self.keys.len())
            .finish()
    }
}

impl KeySource for StaticKeySource {
    fn registration_key(&self, employee_id: &str) -> Option<String> {
        self.keys.get(employee_id).cloned()
    }
}
