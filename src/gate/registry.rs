use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use tracing::{debug, info, instrument, warn};

use crate::error::{RegistrationError, StoreError};
use crate::keys::verify_key;
use crate::model::DeviceBinding;
use crate::store::{BindingStore, KeySource};

/// Whether one device id may be bound to several employees at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DevicePolicy {
    /// No uniqueness across employees; reverse lookup returns the first
    /// binding in store order.
    #[default]
    Shared,
    /// A device bound to one employee cannot be bound to another until it
    /// is released.
    Exclusive,
}

/// Device-to-employee bindings, gated by per-employee registration keys.
pub struct DeviceRegistry {
    store: Arc<dyn BindingStore>,
    keys: Arc<dyn KeySource>,
    policy: DevicePolicy,
    // serializes check-then-write mutations
    writes: Mutex<()>,
}

fn required(value: &str) -> Result<&str, RegistrationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(RegistrationError::MissingFields)
    } else {
        Ok(value)
    }
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn BindingStore>, keys: Arc<dyn KeySource>, policy: DevicePolicy) -> Self {
        Self {
            store,
            keys,
            policy,
            writes: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> DevicePolicy {
        self.policy
    }

    /// Bind `device_id` to `employee_id`, replacing any earlier device for
    /// that employee. The key must match the one provisioned for the
    /// employee; an unknown employee is reported exactly like a wrong key.
    #[instrument(name = "device_register", skip(self, device_id, registration_key))]
    pub fn register(
        &self,
        employee_id: &str,
        device_id: &str,
        registration_key: &str,
    ) -> Result<(), RegistrationError> {
        let employee_id = required(employee_id)?;
        let device_id = required(device_id)?;
        if registration_key.is_empty() {
            return Err(RegistrationError::MissingFields);
        }

        let on_file = self.keys.registration_key(employee_id);
        if !on_file.is_some_and(|key| verify_key(registration_key, &key)) {
            info!("Registration rejected: key mismatch");
            return Err(RegistrationError::InvalidKey);
        }

        self.bind(employee_id, device_id)?;
        info!("Device registered");
        Ok(())
    }

    /// Administrative replacement of an employee's device. No key check.
    pub fn update_device(&self, employee_id: &str, new_device_id: &str) -> Result<(), RegistrationError> {
        let employee_id = required(employee_id)?;
        let device_id = required(new_device_id)?;
        self.bind(employee_id, device_id)?;
        info!(employee_id, "Device updated");
        Ok(())
    }

    /// Drop the employee's binding. Removing an absent binding is not an
    /// error.
    pub fn unregister(&self, employee_id: &str) -> Result<(), RegistrationError> {
        let employee_id = required(employee_id)?;
        let _guard = self.writes.lock();
        let removed = self.store.delete(employee_id)?;
        info!(employee_id, removed, "Device unregistered");
        Ok(())
    }

    /// The employee bound to `device_id`, if any.
    pub fn lookup_employee(&self, device_id: &str) -> Result<Option<String>, StoreError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Ok(None);
        }
        self.store.find_by_device(device_id)
    }

    pub fn list_bindings(&self) -> Result<Vec<DeviceBinding>, StoreError> {
        self.store.scan()
    }

    fn bind(&self, employee_id: &str, device_id: &str) -> Result<(), RegistrationError> {
        let _guard = self.writes.lock();

        if self.policy == DevicePolicy::Exclusive {
            let holder = self
                .store
                .scan()?
                .into_iter()
                .find(|b| b.device_id == device_id && b.employee_id != employee_id);
            if holder.is_some() {
                warn!(employee_id, "Device already bound to another employee");
                return Err(RegistrationError::DeviceAlreadyBound);
            }
        }

        debug!(employee_id, "Writing device binding");
        self.store.put(DeviceBinding::new(employee_id, device_id))?;
        Ok(())
    }
}
