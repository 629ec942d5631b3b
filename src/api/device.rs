use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{AppState, registration_error, run_blocking, store_error};
use crate::model::DeviceBinding;

#[derive(Deserialize, ToSchema)]
pub struct RegisterDevice {
    #[schema(example = "alice")]
    pub employee_id: String,
    #[schema(example = "3f8a4c1e-6b1d-4f2a-9c57-0d2e8b7a5f10")]
    pub device_id: String,
    #[schema(example = "key-A")]
    pub registration_key: String,
}

#[derive(Deserialize, ToSchema)]
pub struct IdentifyDevice {
    pub device_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct IdentifiedEmployee {
    #[schema(example = "alice")]
    pub employee_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDevice {
    pub device_id: String,
}

/// Bind a device to an employee using the employee's registration key
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = RegisterDevice,
    responses(
        (status = 201, description = "Device registered", body = Object, example = json!({
            "message": "Device registered"
        })),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "Invalid registration key or device already bound")
    ),
    tag = "Devices"
)]
pub async fn register_device(
    state: web::Data<AppState>,
    payload: web::Json<RegisterDevice>,
) -> impl Responder {
    let req = payload.into_inner();

    // argon2 verification is CPU heavy; keep it off the worker
    let result = run_blocking("register_device", move || {
        state
            .verifier
            .register_device(&req.employee_id, &req.device_id, &req.registration_key)
    })
    .await;

    match result {
        Ok(Ok(())) => HttpResponse::Created().json(json!({
            "message": "Device registered"
        })),
        Ok(Err(e)) => registration_error(&e),
        Err(resp) => resp,
    }
}

/// Which employee a device belongs to
#[utoipa::path(
    post,
    path = "/api/devices/identify",
    request_body = IdentifyDevice,
    responses(
        (status = 200, description = "Device is bound", body = IdentifiedEmployee),
        (status = 403, description = "Device is not registered")
    ),
    tag = "Devices"
)]
pub async fn identify_device(
    state: web::Data<AppState>,
    payload: web::Json<IdentifyDevice>,
) -> impl Responder {
    let device_id = payload.into_inner().device_id;
    let result = run_blocking("identify_device", move || {
        state.verifier.registry().lookup_employee(&device_id)
    })
    .await;

    match result {
        Ok(Ok(Some(employee_id))) => HttpResponse::Ok().json(IdentifiedEmployee { employee_id }),
        Ok(Ok(None)) => HttpResponse::Forbidden().json(json!({
            "error": "device is not registered to any employee"
        })),
        Ok(Err(e)) => store_error(&e),
        Err(resp) => resp,
    }
}

/// List all device bindings
#[utoipa::path(
    get,
    path = "/api/devices",
    responses((status = 200, description = "Current bindings", body = [DeviceBinding])),
    tag = "Devices"
)]
pub async fn list_devices(state: web::Data<AppState>) -> impl Responder {
    match run_blocking("list_devices", move || state.verifier.registry().list_bindings()).await {
        Ok(Ok(bindings)) => HttpResponse::Ok().json(bindings),
        Ok(Err(e)) => store_error(&e),
        Err(resp) => resp,
    }
}

/// Replace an employee's device
#[utoipa::path(
    put,
    path = "/api/devices/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee id")),
    request_body = UpdateDevice,
    responses(
        (status = 200, description = "Device updated"),
        (status = 400, description = "Missing device id"),
        (status = 403, description = "Device already bound to another employee")
    ),
    tag = "Devices"
)]
pub async fn update_device(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateDevice>,
) -> impl Responder {
    let employee_id = path.into_inner();
    let device_id = payload.into_inner().device_id;
    let result = run_blocking("update_device", move || {
        state.verifier.registry().update_device(&employee_id, &device_id)
    })
    .await;

    match result {
        Ok(Ok(())) => HttpResponse::Ok().json(json!({ "message": "Device updated" })),
        Ok(Err(e)) => registration_error(&e),
        Err(resp) => resp,
    }
}

/// Remove an employee's device binding
#[utoipa::path(
    delete,
    path = "/api/devices/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee id")),
    responses((status = 200, description = "Device removed")),
    tag = "Devices"
)]
pub async fn delete_device(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let employee_id = path.into_inner();
    match run_blocking("delete_device", move || state.verifier.registry().unregister(&employee_id)).await {
        Ok(Ok(())) => HttpResponse::Ok().json(json!({ "message": "Device removed" })),
        Ok(Err(e)) => registration_error(&e),
        Err(resp) => resp,
    }
}
