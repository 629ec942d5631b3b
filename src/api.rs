pub mod attendance;
pub mod device;
pub mod report;

use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::error;

use crate::error::{RegistrationError, StoreError, VerificationError};
use crate::report::Reports;
use crate::verifier::AttendanceVerifier;

/// Shared application state handed to every handler.
pub struct AppState {
    pub verifier: AttendanceVerifier,
    pub reports: Reports,
}

impl AppState {
    pub fn new(verifier: AttendanceVerifier, reports: Reports) -> Self {
        Self { verifier, reports }
    }
}

/// Run store and key work on the blocking pool. A failed task is logged and
/// answered with a 500.
pub(crate) async fn run_blocking<T, F>(task: &'static str, f: F) -> Result<T, HttpResponse>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(|e| {
        error!(error = %e, task, "Blocking task failed");
        internal_error()
    })
}

pub(crate) fn verification_error(e: &VerificationError) -> HttpResponse {
    match e {
        VerificationError::OutOfRange
        | VerificationError::InvalidOrExpiredCode
        | VerificationError::UnboundDevice => {
            HttpResponse::Forbidden().json(json!({ "error": e.to_string() }))
        }
        VerificationError::PersistenceFailure(_) => internal_error(),
    }
}

pub(crate) fn registration_error(e: &RegistrationError) -> HttpResponse {
    match e {
        RegistrationError::MissingFields => {
            HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
        }
        RegistrationError::InvalidKey | RegistrationError::DeviceAlreadyBound => {
            HttpResponse::Forbidden().json(json!({ "error": e.to_string() }))
        }
        RegistrationError::PersistenceFailure(inner) => store_error(inner),
    }
}

pub(crate) fn store_error(e: &StoreError) -> HttpResponse {
    error!(error = %e, "Storage error");
    internal_error()
}

pub(crate) fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "error": "Internal Server Error"
    }))
}
