use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use parcel_tracker::api::rest::router;
use parcel_tracker::editor::EditorOptions;
use parcel_tracker::models::event::TrackingEventKind;
use parcel_tracker::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(1024)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn package_body(tracking_number: Option<&str>) -> Value {
    let mut tracking = json!({ "status": "pending" });
    if let Some(tracking_number) = tracking_number {
        tracking["tracking_number"] = json!(tracking_number);
    }

    json!({
        "details": {
            "description": "Espresso machine",
            "weight": 7.5,
            "dimensions": { "length": 40.0, "width": 30.0, "height": 45.0 },
            "images": ["https://cdn.example.com/espresso.jpg"]
        },
        "sender": {
            "full_name": "Giulia Bianchi",
            "email": "giulia@example.com",
            "phone": "+39 02 1234 5678",
            "address": "Via Roma 1, Milano"
        },
        "recipient": {
            "full_name": "Jonas Weber",
            "email": "jonas@example.com",
            "phone": "+49 30 1234 5678",
            "address": "Unter den Linden 5, Berlin"
        },
        "tracking": tracking
    })
}

async fn create_package(app: &axum::Router, tracking_number: &str) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/packages",
            package_body(Some(tracking_number)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn add_checkpoint(app: &axum::Router, tracking_number: &str, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/packages/{tracking_number}/checkpoints"),
            body,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["packages"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    create_package(&app, "PTMETRICS1").await;
    add_checkpoint(
        &app,
        "PTMETRICS1",
        json!({ "location": "Hub", "description": "Scanned", "status": "in_warehouse" }),
    )
    .await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("packages_total 1"));
    assert!(body.contains("checkpoint_mutations_total"));
}

#[tokio::test]
async fn create_package_generates_tracking_number() {
    let app = setup();
    let response = app
        .oneshot(json_request("POST", "/packages", package_body(None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["tracking_number"].as_str().unwrap().starts_with("PT"));
    assert_eq!(body["status"], "pending");
    assert_eq!(body["checkpoints"].as_array().unwrap().len(), 0);
    assert_eq!(body["sender"]["full_name"], "Giulia Bianchi");
}

#[tokio::test]
async fn create_package_missing_recipient_name_returns_422() {
    let app = setup();
    let mut body = package_body(None);
    body["recipient"]["full_name"] = json!("  ");

    let response = app
        .oneshot(json_request("POST", "/packages", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["field"], "recipient_name");
    assert_eq!(body["code"], "recipient_name_required");
}

#[tokio::test]
async fn duplicate_tracking_number_returns_409() {
    let app = setup();
    create_package(&app, "PTDUP00001").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/packages",
            package_body(Some("PTDUP00001")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_nonexistent_package_returns_404() {
    let app = setup();
    let response = app
        .oneshot(get_request("/packages/PTNOPE0000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_checkpoint_updates_package_status() {
    let app = setup();
    create_package(&app, "PTADD00001").await;

    let res = add_checkpoint(
        &app,
        "PTADD00001",
        json!({
            "location": "Milano hub",
            "description": "Departed origin facility",
            "status": "in_transit",
            "coordinates": { "latitude": 45.46, "longitude": 9.19 }
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let checkpoint = body_json(res).await;
    assert!(!checkpoint["id"].as_str().unwrap().is_empty());
    assert!(checkpoint["timestamp"].as_str().unwrap().contains('T'));

    let res = app
        .oneshot(get_request("/packages/PTADD00001"))
        .await
        .unwrap();
    let package = body_json(res).await;
    assert_eq!(package["status"], "in_transit");
    assert_eq!(package["checkpoints"].as_array().unwrap().len(), 1);
    assert_eq!(package["current_location"]["address"], "Milano hub");
    assert_eq!(package["current_location"]["coordinates"]["latitude"], 45.46);
}

#[tokio::test]
async fn blank_description_returns_422_and_keeps_list() {
    let app = setup();
    create_package(&app, "PTBLANK001").await;

    let res = add_checkpoint(
        &app,
        "PTBLANK001",
        json!({ "location": "Sorting Facility", "description": "", "status": "in_transit" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(res).await;
    assert_eq!(body["field"], "description");

    let res = app
        .oneshot(get_request("/packages/PTBLANK001"))
        .await
        .unwrap();
    let package = body_json(res).await;
    assert_eq!(package["checkpoints"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn coordinates_required_when_map_entry_enabled() {
    let mut state = AppState::new(1024);
    state.editor_options = EditorOptions {
        require_coordinates: true,
    };
    let app = router(Arc::new(state));
    create_package(&app, "PTMAP00001").await;

    let res = add_checkpoint(
        &app,
        "PTMAP00001",
        json!({ "location": "Hub", "description": "Scanned", "status": "arrived" }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["code"], "coordinates_required");
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let app = setup();
    create_package(&app, "PTGEO00001").await;

    let res = add_checkpoint(
        &app,
        "PTGEO00001",
        json!({
            "location": "Hub",
            "description": "Scanned",
            "status": "arrived",
            "coordinates": { "latitude": 200.0, "longitude": 10.0 }
        }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["code"], "coordinates_invalid");
}

#[tokio::test]
async fn update_and_load_checkpoint() {
    let app = setup();
    create_package(&app, "PTUPD00001").await;
    let res = add_checkpoint(
        &app,
        "PTUPD00001",
        json!({ "location": "Hub", "description": "Scanned", "status": "in_warehouse" }),
    )
    .await;
    let checkpoint = body_json(res).await;
    let id = checkpoint["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(get_request(&format!("/packages/PTUPD00001/checkpoints/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let mut draft = body_json(res).await;
    assert_eq!(draft["location"], "Hub");

    draft["description"] = json!("Held for customs inspection");
    draft["status"] = json!("customs_hold");
    let res = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/packages/PTUPD00001/checkpoints/{id}"),
            draft,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["id"], id);
    assert_eq!(updated["timestamp"], checkpoint["timestamp"]);

    let res = app.oneshot(get_request("/track/PTUPD00001")).await.unwrap();
    let view = body_json(res).await;
    assert_eq!(view["status"], "customs_hold");
    assert_eq!(view["progress"], 85);
}

#[tokio::test]
async fn update_unknown_checkpoint_returns_404() {
    let app = setup();
    create_package(&app, "PTUPD00002").await;

    let res = app
        .oneshot(json_request(
            "PUT",
            "/packages/PTUPD00002/checkpoints/00000000-0000-0000-0000-000000000000",
            json!({ "location": "Hub", "description": "Scanned", "status": "arrived" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_checkpoint_twice_returns_404() {
    let app = setup();
    create_package(&app, "PTDEL00001").await;
    let res = add_checkpoint(
        &app,
        "PTDEL00001",
        json!({ "location": "Hub", "description": "Scanned", "status": "pending" }),
    )
    .await;
    let id = body_json(res).await["id"].as_str().unwrap().to_string();
    let uri = format!("/packages/PTDEL00001/checkpoints/{id}");

    let first = app.clone().oneshot(delete_request(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(delete_request(&uri)).await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tracking_view_for_full_journey() {
    let app = setup();
    create_package(&app, "PTJOURNEY1").await;

    for (status, ts, lat, lng) in [
        ("pending", "2024-01-01T00:00:00Z", 45.46, 9.19),
        ("in_transit", "2024-01-02T00:00:00Z", 47.37, 8.54),
        ("delivered", "2024-01-03T00:00:00Z", 52.52, 13.40),
    ] {
        let res = add_checkpoint(
            &app,
            "PTJOURNEY1",
            json!({
                "location": format!("Stop {status}"),
                "description": "Scanned",
                "status": status,
                "timestamp": ts,
                "coordinates": { "latitude": lat, "longitude": lng }
            }),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.oneshot(get_request("/track/PTJOURNEY1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let view = body_json(res).await;
    assert_eq!(view["status"], "delivered");
    assert_eq!(view["status_label"], "Delivered");
    assert_eq!(view["status_color"], "green");
    assert_eq!(view["progress"], 100);
    assert_eq!(view["path"].as_array().unwrap().len(), 4);
    assert!(view["distance_travelled_km"].as_f64().unwrap() > 500.0);
    assert!(view["payment"].is_null());

    let timeline = view["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0]["status"], "delivered");
    assert_eq!(timeline[2]["label"], "Pending");
}

#[tokio::test]
async fn track_unknown_package_returns_404() {
    let app = setup();
    let res = app.oneshot(get_request("/track/PTMISSING1")).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_package_keeps_checkpoints() {
    let app = setup();
    create_package(&app, "PTEDIT0001").await;
    add_checkpoint(
        &app,
        "PTEDIT0001",
        json!({ "location": "Hub", "description": "Scanned", "status": "arrived" }),
    )
    .await;

    let mut body = package_body(None);
    body["details"]["description"] = json!("Espresso machine (refurbished)");
    let res = app
        .clone()
        .oneshot(json_request("PUT", "/packages/PTEDIT0001", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let package = body_json(res).await;
    assert_eq!(package["description"], "Espresso machine (refurbished)");
    assert_eq!(package["checkpoints"].as_array().unwrap().len(), 1);
    assert_eq!(package["status"], "arrived");
}

#[tokio::test]
async fn update_package_with_checkpoint_drafts_returns_422() {
    let app = setup();
    create_package(&app, "PTEDIT0002").await;

    let mut body = package_body(None);
    body["tracking"]["checkpoints"] = json!([
        { "location": "Hub", "description": "Scanned", "status": "in_transit" }
    ]);
    let res = app
        .clone()
        .oneshot(json_request("PUT", "/packages/PTEDIT0002", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(res).await;
    assert_eq!(error["field"], "checkpoints");
    assert_eq!(error["code"], "checkpoints_invalid");

    let res = app
        .oneshot(get_request("/packages/PTEDIT0002"))
        .await
        .unwrap();
    let package = body_json(res).await;
    assert!(package["checkpoints"].as_array().unwrap().is_empty());
    assert_eq!(package["status"], "pending");
}

#[tokio::test]
async fn deleting_last_checkpoint_restores_form_status() {
    let app = setup();
    create_package(&app, "PTEMPTY001").await;
    let res = add_checkpoint(
        &app,
        "PTEMPTY001",
        json!({
            "location": "Paris",
            "description": "Handed over",
            "status": "delivered",
            "coordinates": { "latitude": 48.85, "longitude": 2.35 }
        }),
    )
    .await;
    let id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(delete_request(&format!("/packages/PTEMPTY001/checkpoints/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request("/packages/PTEMPTY001"))
        .await
        .unwrap();
    let package = body_json(res).await;
    assert!(package["checkpoints"].as_array().unwrap().is_empty());
    assert_eq!(package["status"], "pending");
    assert!(package["current_location"].is_null());
}

#[tokio::test]
async fn concurrent_adds_are_both_kept() {
    let app = setup();
    create_package(&app, "PTRACE0001").await;

    let (first, second) = tokio::join!(
        add_checkpoint(
            &app,
            "PTRACE0001",
            json!({ "location": "Hub A", "description": "Scanned", "status": "in_warehouse" }),
        ),
        add_checkpoint(
            &app,
            "PTRACE0001",
            json!({ "location": "Hub B", "description": "Scanned", "status": "in_transit" }),
        ),
    );
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request("/packages/PTRACE0001"))
        .await
        .unwrap();
    let package = body_json(res).await;
    assert_eq!(package["checkpoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_package_cascades() {
    let app = setup();
    create_package(&app, "PTGONE0001").await;
    add_checkpoint(
        &app,
        "PTGONE0001",
        json!({ "location": "Hub", "description": "Scanned", "status": "pending" }),
    )
    .await;

    let res = app
        .clone()
        .oneshot(delete_request("/packages/PTGONE0001"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let removed = body_json(res).await;
    assert_eq!(removed["checkpoints"].as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(get_request("/packages/PTGONE0001"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(body_json(res).await["packages"], 0);
}

#[tokio::test]
async fn mutations_are_broadcast() {
    let state = Arc::new(AppState::new(16));
    let mut events = state.events_tx.subscribe();
    let app = router(state.clone());

    create_package(&app, "PTEVENT001").await;
    add_checkpoint(
        &app,
        "PTEVENT001",
        json!({ "location": "Hub", "description": "Scanned", "status": "in_warehouse" }),
    )
    .await;

    let created = events.recv().await.unwrap();
    assert_eq!(created.kind, TrackingEventKind::PackageCreated);

    let added = events.recv().await.unwrap();
    assert_eq!(added.kind, TrackingEventKind::CheckpointAdded);
    assert_eq!(added.tracking_number, "PTEVENT001");
    assert_eq!(added.checkpoint.unwrap().location, "Hub");
}
