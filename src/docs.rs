use crate::api::attendance::{AttendanceRequest, CodeRequest};
use crate::api::device::{IdentifiedEmployee, IdentifyDevice, RegisterDevice, UpdateDevice};
use crate::model::{AttendanceRecord, Coordinate, DeviceBinding, EventType, Zone};
use crate::report::EventCounts;
use crate::verifier::IssuedCode;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geofenced Attendance API",
        version = "0.1.0",
        description = r#"
## Geofenced attendance

Employees check in and out from a registered phone while standing at an
authorized location.

### Flow
1. **Code** - a device inside a zone asks for the current one-time code.
2. **Attendance** - the device submits the code with its position, its
   device id and the event type. Location, code and device binding are
   verified in that order; the first failure rejects the event.
3. **Devices** - an employee binds a device once with a registration key
   handed out by an administrator.

### Reports
Read-only views by zone and day, by employee, by time range, and
per-employee / per-zone counts.
"#,
    ),
    paths(
        crate::api::attendance::generate_code,
        crate::api::attendance::record_attendance,

        crate::api::device::register_device,
        crate::api::device::identify_device,
        crate::api::device::list_devices,
        crate::api::device::update_device,
        crate::api::device::delete_device,

        crate::api::report::by_zone,
        crate::api::report::by_employee,
        crate::api::report::in_range,
        crate::api::report::summary,
        crate::api::report::zone_summary
    ),
    components(
        schemas(
            CodeRequest,
            AttendanceRequest,
            AttendanceRecord,
            EventType,
            IssuedCode,
            Coordinate,
            Zone,
            DeviceBinding,
            RegisterDevice,
            IdentifyDevice,
            IdentifiedEmployee,
            UpdateDevice,
            EventCounts
        )
    ),
    tags(
        (name = "Attendance", description = "Code issuing and attendance verification"),
        (name = "Devices", description = "Device registration and administration"),
        (name = "Reports", description = "Attendance reports"),
    )
)]
pub struct ApiDoc;
