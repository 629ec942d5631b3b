//! Geofenced attendance verification.
//!
//! The core checks three gates for every check-in or check-out: the
//! reported position is inside an authorized zone, the submitted one-time
//! code is fresh, and the reporting device is bound to an employee. Only
//! then is an [`model::AttendanceRecord`] handed to the record sink.
//!
//! Storage and transport live behind the traits in [`store`]; the binary
//! target wires them to an actix-web host.

pub mod api;
pub mod clock;
pub mod config;
pub mod docs;
pub mod error;
pub mod gate;
pub mod keys;
pub mod model;
pub mod report;
pub mod routes;
pub mod store;
pub mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{RegistrationError, StoreError, VerificationError, ZoneError};
pub use gate::code::{CodeEngine, CodePolicy, SharedSecret};
pub use gate::geofence::GeofenceResolver;
pub use gate::registry::{DevicePolicy, DeviceRegistry};
pub use verifier::{AttendanceVerifier, IssuedCode};
