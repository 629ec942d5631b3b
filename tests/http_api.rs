use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web::Data};
use geo_attend::api::AppState;
use geo_attend::model::{Coordinate, Zone};
use geo_attend::report::Reports;
use geo_attend::routes::{self, Limiters, build_limiter};
use geo_attend::error::StoreError;
use geo_attend::model::DeviceBinding;
use geo_attend::store::{BindingStore, MemoryBindingStore, MemoryRecordStore, StaticKeySource};
use geo_attend::{
    AttendanceVerifier, CodeEngine, CodePolicy, DevicePolicy, DeviceRegistry, FixedClock,
    GeofenceResolver, SharedSecret,
};
use serde_json::{Value, json};

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn state() -> Data<AppState> {
    state_with(Arc::new(MemoryBindingStore::new()))
}

fn state_with(bindings: Arc<dyn BindingStore>) -> Data<AppState> {
    let records = Arc::new(MemoryRecordStore::new());
    let keys: StaticKeySource = [("Alice", "key-A")].into_iter().collect();
    let verifier = AttendanceVerifier::new(
        GeofenceResolver::new(vec![Zone::new("Store A", 6.1491, -75.6191)], 1000.0).unwrap(),
        CodeEngine::new(SharedSecret::from("S1"), CodePolicy::default()),
        DeviceRegistry::new(bindings, Arc::new(keys), DevicePolicy::Shared),
        records.clone(),
        Arc::new(FixedClock::at_unix(1_767_600_000)),
    );
    Data::new(AppState::new(verifier, Reports::new(records)))
}

/// Binding store whose backing storage has gone away.
struct OfflineBindings;

impl BindingStore for OfflineBindings {
    fn get(&self, _: &str) -> Result<Option<DeviceBinding>, StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }

    fn put(&self, _: DeviceBinding) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }

    fn delete(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }

    fn scan(&self) -> Result<Vec<DeviceBinding>, StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }
}

fn limiters() -> Limiters {
    let limit = || Arc::new(build_limiter(10_000).unwrap());
    Limiters::new(limit(), limit(), limit(), limit())
}

macro_rules! app {
    ($state:expr) => {{
        let limiters = limiters();
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(|cfg| routes::configure(cfg, "/api", &limiters)),
        )
        .await
    }};
}

#[actix_web::test]
async fn check_in_flow_over_http() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/devices")
        .peer_addr(peer())
        .set_json(json!({"employee_id": "Alice", "device_id": "dev-123", "registration_key": "key-A"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/code")
        .peer_addr(peer())
        .set_json(json!({"latitude": 6.1491, "longitude": -75.6191}))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(issued["zone"], "Store A");
    let code = issued["code"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .peer_addr(peer())
        .set_json(json!({
            "device_id": "dev-123",
            "event_type": "check-in",
            "latitude": 6.1491,
            "longitude": -75.6191,
            "code": code
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let record: Value = test::read_body_json(resp).await;
    assert_eq!(record["employee_id"], "Alice");
    assert_eq!(record["event_type"], "check-in");
    assert_eq!(record["zone_name"], "Store A");

    let req = test::TestRequest::get()
        .uri("/api/reports/employee?employee=Alice")
        .peer_addr(peer())
        .to_request();
    let rows: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/reports/summary")
        .peer_addr(peer())
        .to_request();
    let summary: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(summary["Alice"]["check_ins"], 1);
}

#[actix_web::test]
async fn rejections_map_to_status_codes() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/code")
        .peer_addr(peer())
        .set_json(json!({"latitude": 40.0, "longitude": -3.7}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .peer_addr(peer())
        .set_json(json!({
            "device_id": "dev-999",
            "event_type": "check-out",
            "latitude": 6.1491,
            "longitude": -75.6191,
            "code": "abc"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid or expired code");

    let req = test::TestRequest::post()
        .uri("/api/devices")
        .peer_addr(peer())
        .set_json(json!({"employee_id": "Alice", "device_id": "", "registration_key": "key-A"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/devices")
        .peer_addr(peer())
        .set_json(json!({"employee_id": "Alice", "device_id": "dev-1", "registration_key": "nope"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/devices/identify")
        .peer_addr(peer())
        .set_json(json!({"device_id": "dev-1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn device_administration() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::put()
        .uri("/api/devices/Alice")
        .peer_addr(peer())
        .set_json(json!({"device_id": "dev-7"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/devices/identify")
        .peer_addr(peer())
        .set_json(json!({"device_id": "dev-7"}))
        .to_request();
    let who: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(who["employee_id"], "Alice");

    let req = test::TestRequest::delete()
        .uri("/api/devices/Alice")
        .peer_addr(peer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/devices")
        .peer_addr(peer())
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list, json!([]));
}

#[actix_web::test]
async fn report_routes_answer_from_recorded_events() {
    let state = state();
    let app = app!(state);

    state.verifier.register_device("Alice", "dev-123", "key-A").unwrap();
    let code = state
        .verifier
        .generate_code(Coordinate::new(6.1491, -75.6191))
        .unwrap()
        .code;
    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .peer_addr(peer())
        .set_json(json!({
            "device_id": "dev-123",
            "event_type": "check-out",
            "latitude": 6.1491,
            "longitude": -75.6191,
            "code": code
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/reports/zone?zone=Store%20A&date=2026-01-05")
        .peer_addr(peer())
        .to_request();
    let rows: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/reports/zone?zone=Store%20A&date=2026-01-06")
        .peer_addr(peer())
        .to_request();
    let rows: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rows, json!([]));

    let req = test::TestRequest::get()
        .uri("/api/reports/range?start=2026-01-05T00:00:00Z&end=2026-01-05T08:00:00Z")
        .peer_addr(peer())
        .to_request();
    let rows: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rows[0]["employee_id"], "Alice");

    let req = test::TestRequest::get()
        .uri("/api/reports/zones")
        .peer_addr(peer())
        .to_request();
    let zones: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(zones["Store A"], json!({"check_ins": 0, "check_outs": 1}));
}

#[actix_web::test]
async fn storage_outage_is_a_server_error() {
    let state = state_with(Arc::new(OfflineBindings));
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/devices")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Internal Server Error");

    let req = test::TestRequest::post()
        .uri("/api/devices/identify")
        .peer_addr(peer())
        .set_json(json!({"device_id": "dev-1"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let req = test::TestRequest::put()
        .uri("/api/devices/Alice")
        .peer_addr(peer())
        .set_json(json!({"device_id": "dev-7"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let req = test::TestRequest::delete()
        .uri("/api/devices/Alice")
        .peer_addr(peer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
