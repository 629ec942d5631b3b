//! The three admission gates: location, code, device.

pub mod code;
pub mod geofence;
pub mod registry;
