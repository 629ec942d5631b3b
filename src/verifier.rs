//! Composition root: runs the location, code and device gates in order and
//! commits the resulting record.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::error::{RegistrationError, StoreError, VerificationError};
use crate::gate::code::CodeEngine;
use crate::gate::geofence::GeofenceResolver;
use crate::gate::registry::DeviceRegistry;
use crate::model::{AttendanceRecord, Coordinate, EventType};
use crate::store::RecordSink;

/// A code handed out to someone standing inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IssuedCode {
    #[schema(example = "482913")]
    pub code: String,
    #[schema(example = "Store A")]
    pub zone: String,
}

pub struct AttendanceVerifier {
    geofence: GeofenceResolver,
    codes: CodeEngine,
    registry: DeviceRegistry,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
}

impl AttendanceVerifier {
    pub fn new(
        geofence: GeofenceResolver,
        codes: CodeEngine,
        registry: DeviceRegistry,
        sink: Arc<dyn RecordSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            geofence,
            codes,
            registry,
            sink,
            clock,
        }
    }

    pub fn geofence(&self) -> &GeofenceResolver {
        &self.geofence
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Current code for someone at `at`, with the zone they are in.
    pub fn generate_code(&self, at: Coordinate) -> Result<IssuedCode, VerificationError> {
        let Some(found) = self.geofence.resolve(at) else {
            info!("Code refused: not near an authorized zone");
            return Err(VerificationError::OutOfRange);
        };

        info!(zone = %found.zone.name, "Code issued");
        Ok(IssuedCode {
            code: self.codes.generate(self.clock.now()),
            zone: found.zone.name,
        })
    }

    /// Admit or reject one attendance event.
    ///
    /// Gates run location, code, device; the first failure ends the attempt.
    /// Nothing is retried. A record is only built and handed to the sink
    /// once all three pass.
    #[instrument(
        name = "attendance_verify",
        skip(self, device_id, event_type, submitted_code),
        fields(event_type = %event_type)
    )]
    pub fn verify_and_record(
        &self,
        device_id: &str,
        event_type: EventType,
        at: Coordinate,
        submitted_code: &str,
    ) -> Result<AttendanceRecord, VerificationError> {
        let now = self.clock.now();

        // 1️⃣ Location
        let Some(found) = self.geofence.resolve(at) else {
            info!("Rejected: out of range");
            return Err(VerificationError::OutOfRange);
        };

        // 2️⃣ Code
        if !self.codes.validate(submitted_code, now) {
            info!(zone = %found.zone.name, "Rejected: invalid or expired code");
            return Err(VerificationError::InvalidOrExpiredCode);
        }

        // 3️⃣ Device
        let employee_id = match self.registry.lookup_employee(device_id) {
            Ok(Some(id)) => id,
            Ok(None) => {
                info!(zone = %found.zone.name, "Rejected: unbound device");
                return Err(VerificationError::UnboundDevice);
            }
            Err(e) => return Err(persistence_failure(e)),
        };

        // 4️⃣ Commit
        let record = AttendanceRecord {
            timestamp_utc: now,
            employee_id,
            event_type,
            zone_name: found.zone.name,
            latitude: at.latitude,
            longitude: at.longitude,
        };
        self.sink.append(&record).map_err(persistence_failure)?;

        info!(
            employee_id = %record.employee_id,
            zone = %record.zone_name,
            "Attendance recorded"
        );
        Ok(record)
    }

    /// Key-gated device registration; see [`DeviceRegistry::register`].
    pub fn register_device(
        &self,
        employee_id: &str,
        device_id: &str,
        registration_key: &str,
    ) -> Result<(), RegistrationError> {
        self.registry.register(employee_id, device_id, registration_key)
    }
}

fn persistence_failure(e: StoreError) -> VerificationError {
    error!(error = %e, "Attendance storage failed");
    VerificationError::PersistenceFailure(e)
}
