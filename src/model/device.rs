use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The device currently bound to an employee. One per employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeviceBinding {
    #[schema(example = "alice")]
    pub employee_id: String,
    #[schema(example = "3f8a4c1e-6b1d-4f2a-9c57-0d2e8b7a5f10")]
    pub device_id: String,
}

impl DeviceBinding {
    pub fn new(employee_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            device_id: device_id.into(),
        }
    }
}
