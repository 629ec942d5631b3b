use parking_lot::RwLock;

use crate::error::StoreError;
use crate::model::{AttendanceRecord, DeviceBinding};

use super::{BindingStore, RecordSink, RecordSource};

/// Bindings kept in registration order. Overwriting an employee keeps its
/// slot; deleting and re-registering moves it to the end.
#[derive(Debug, Default)]
pub struct MemoryBindingStore {
    bindings: RwLock<Vec<DeviceBinding>>,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: Vec<DeviceBinding>) -> Self {
        let store = Self::new();
        for b in bindings {
            upsert(&mut store.bindings.write(), b);
        }
        store
    }
}

pub(crate) fn upsert(bindings: &mut Vec<DeviceBinding>, binding: DeviceBinding) {
    match bindings
        .iter_mut()
        .find(|b| b.employee_id == binding.employee_id)
    {
        Some(existing) => existing.device_id = binding.device_id,
        None => bindings.push(binding),
    }
}

impl BindingStore for MemoryBindingStore {
    fn get(&self, employee_id: &str) -> Result<Option<DeviceBinding>, StoreError> {
        Ok(self
            .bindings
            .read()
            .iter()
            .find(|b| b.employee_id == employee_id)
            .cloned())
    }

    fn put(&self, binding: DeviceBinding) -> Result<(), StoreError> {
        upsert(&mut self.bindings.write(), binding);
        Ok(())
    }

    fn delete(&self, employee_id: &str) -> Result<bool, StoreError> {
        let mut bindings = self.bindings.write();
        let before = bindings.len();
        bindings.retain(|b| b.employee_id != employee_id);
        Ok(bindings.len() != before)
    }

    fn scan(&self) -> Result<Vec<DeviceBinding>, StoreError> {
        Ok(self.bindings.read().clone())
    }

    fn find_by_device(&self, device_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .bindings
            .read()
            .iter()
            .find(|b| b.device_id == device_id)
            .map(|b| b.employee_id.clone()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<AttendanceRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordSink for MemoryRecordStore {
    fn append(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }
}

impl RecordSource for MemoryRecordStore {
    fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.records.read().clone())
    }
}
