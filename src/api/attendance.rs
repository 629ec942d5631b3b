use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{AppState, run_blocking, verification_error};
use crate::model::{AttendanceRecord, Coordinate, EventType};
use crate::verifier::IssuedCode;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CodeRequest {
    #[schema(example = 6.1491)]
    pub latitude: f64,
    #[schema(example = json!(-75.6191))]
    pub longitude: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct AttendanceRequest {
    #[schema(example = "3f8a4c1e-6b1d-4f2a-9c57-0d2e8b7a5f10")]
    pub device_id: String,
    #[schema(example = "check-in")]
    pub event_type: EventType,
    #[schema(example = 6.1491)]
    pub latitude: f64,
    #[schema(example = json!(-75.6191))]
    pub longitude: f64,
    #[schema(example = "482913")]
    pub code: String,
}

/// Issue the current code to someone standing in an authorized zone
#[utoipa::path(
    post,
    path = "/api/code",
    request_body = CodeRequest,
    responses(
        (status = 200, description = "Code issued", body = IssuedCode),
        (status = 403, description = "Not near an authorized zone", body = Object, example = json!({
            "error": "not within range of an authorized zone"
        }))
    ),
    tag = "Attendance"
)]
pub async fn generate_code(
    state: web::Data<AppState>,
    payload: web::Json<CodeRequest>,
) -> impl Responder {
    let at = Coordinate::new(payload.latitude, payload.longitude);
    match state.verifier.generate_code(at) {
        Ok(issued) => HttpResponse::Ok().json(issued),
        Err(e) => verification_error(&e),
    }
}

/// Verify location, code and device, then record the event
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 403, description = "Out of range, invalid or expired code, or unregistered device", body = Object, example = json!({
            "error": "invalid or expired code"
        })),
        (status = 500, description = "Record could not be stored")
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    state: web::Data<AppState>,
    payload: web::Json<AttendanceRequest>,
) -> impl Responder {
    let req = payload.into_inner();
    let at = Coordinate::new(req.latitude, req.longitude);

    let result = run_blocking("record_attendance", move || {
        state
            .verifier
            .verify_and_record(&req.device_id, req.event_type, at, &req.code)
    })
    .await;

    match result {
        Ok(Ok(record)) => HttpResponse::Created().json(record),
        Ok(Err(e)) => verification_error(&e),
        Err(resp) => resp,
    }
}
