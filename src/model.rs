pub mod attendance;
pub mod device;
pub mod zone;

pub use attendance::{AttendanceRecord, EventType};
pub use device::DeviceBinding;
pub use zone::{Coordinate, ProximityMatch, Zone};
