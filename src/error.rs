use derive_more::Display;

/// Failure of a collaborator behind one of the store traits.
#[derive(Debug, Clone, Display, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "storage I/O failed: {}", _0)]
    Io(String),
    #[display(fmt = "stored data is corrupt: {}", _0)]
    Corrupt(String),
    #[display(fmt = "storage unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Why an attendance event was not admitted.
///
/// The security-sensitive kinds carry no detail about which employee or
/// device was expected.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum VerificationError {
    #[display(fmt = "not within range of an authorized zone")]
    OutOfRange,
    #[display(fmt = "invalid or expired code")]
    InvalidOrExpiredCode,
    #[display(fmt = "device is not registered to any employee")]
    UnboundDevice,
    #[display(fmt = "failed to store attendance record: {}", _0)]
    PersistenceFailure(StoreError),
}

impl std::error::Error for VerificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerificationError::PersistenceFailure(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum RegistrationError {
    #[display(fmt = "employee id, device id and registration key are required")]
    MissingFields,
    #[display(fmt = "invalid registration key")]
    InvalidKey,
    #[display(fmt = "device is already bound to another employee")]
    DeviceAlreadyBound,
    #[display(fmt = "failed to store device binding: {}", _0)]
    PersistenceFailure(StoreError),
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::PersistenceFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        RegistrationError::PersistenceFailure(e)
    }
}

/// Rejected zone configuration.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum ZoneError {
    #[display(fmt = "zone '{}' is configured more than once", _0)]
    DuplicateName(String),
    #[display(fmt = "zone '{}' has an invalid coordinate", _0)]
    InvalidCoordinate(String),
}

impl std::error::Error for ZoneError {}
