use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::{AppState, run_blocking, store_error};
use crate::error::StoreError;
use crate::model::AttendanceRecord;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ZoneDayQuery {
    /// Zone name
    #[param(example = "Store A")]
    pub zone: String,
    /// UTC calendar day
    #[param(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    #[param(example = "alice")]
    pub employee: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// Inclusive lower bound
    #[param(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub start: DateTime<Utc>,
    /// Inclusive upper bound
    #[param(example = "2026-01-31T23:59:59Z", value_type = String, format = "date-time")]
    pub end: DateTime<Utc>,
}

/// Run a report query off the worker and answer with its JSON result.
async fn report<T, F>(task: &'static str, f: F) -> HttpResponse
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Serialize + Send + 'static,
{
    match run_blocking(task, f).await {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => store_error(&e),
        Err(resp) => resp,
    }
}

/// Records for one zone on one day
#[utoipa::path(
    get,
    path = "/api/reports/zone",
    params(ZoneDayQuery),
    responses((status = 200, description = "Matching records", body = [AttendanceRecord])),
    tag = "Reports"
)]
pub async fn by_zone(state: web::Data<AppState>, query: web::Query<ZoneDayQuery>) -> impl Responder {
    let ZoneDayQuery { zone, date } = query.into_inner();
    report("report_by_zone", move || state.reports.by_zone_on_date(&zone, date)).await
}

/// Records for one employee
#[utoipa::path(
    get,
    path = "/api/reports/employee",
    params(EmployeeQuery),
    responses((status = 200, description = "Matching records", body = [AttendanceRecord])),
    tag = "Reports"
)]
pub async fn by_employee(state: web::Data<AppState>, query: web::Query<EmployeeQuery>) -> impl Responder {
    let employee = query.into_inner().employee;
    report("report_by_employee", move || state.reports.by_employee(&employee)).await
}

/// Records within a time range
#[utoipa::path(
    get,
    path = "/api/reports/range",
    params(RangeQuery),
    responses((status = 200, description = "Matching records", body = [AttendanceRecord])),
    tag = "Reports"
)]
pub async fn in_range(state: web::Data<AppState>, query: web::Query<RangeQuery>) -> impl Responder {
    let RangeQuery { start, end } = query.into_inner();
    report("report_in_range", move || state.reports.in_range(start, end)).await
}

/// Check-in and check-out counts per employee
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    responses((status = 200, description = "Counts keyed by employee id", body = Object)),
    tag = "Reports"
)]
pub async fn summary(state: web::Data<AppState>) -> impl Responder {
    report("report_summary", move || state.reports.summary()).await
}

/// Check-in and check-out counts per zone
#[utoipa::path(
    get,
    path = "/api/reports/zones",
    responses((status = 200, description = "Counts keyed by zone name", body = Object)),
    tag = "Reports"
)]
pub async fn zone_summary(state: web::Data<AppState>) -> impl Responder {
    report("report_zone_summary", move || state.reports.zone_summary()).await
}
