use super::*;
use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::domain::TravelMode;
use tokio::net::TcpListener;

use crate::presentation::CloseFieldSet;

#[derive(Clone)]
struct MockBackendState {
    routes_body: Arc<Mutex<String>>,
    current_body: Arc<Mutex<String>>,
    write_status: Arc<Mutex<StatusCode>>,
    reads: Arc<Mutex<Vec<HashMap<String, String>>>>,
    writes: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockBackendState {
    fn new() -> Self {
        Self {
            routes_body: Arc::new(Mutex::new(
                r#"{"ok":true,"routes":["North Loop","Market Road"]}"#.to_string(),
            )),
            current_body: Arc::new(Mutex::new(r#"{"ok":true,"current":null}"#.to_string())),
            write_status: Arc::new(Mutex::new(StatusCode::OK)),
            reads: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn set_current(&self, current: serde_json::Value) {
        *self.current_body.lock().await =
            serde_json::json!({ "ok": true, "current": current }).to_string();
    }

    async fn set_current_raw(&self, body: &str) {
        *self.current_body.lock().await = body.to_string();
    }

    async fn read_count(&self) -> usize {
        self.reads.lock().await.len()
    }

    async fn writes(&self) -> Vec<serde_json::Value> {
        self.writes.lock().await.clone()
    }
}

async fn handle_read(
    State(state): State<MockBackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let action = query.get("action").cloned().unwrap_or_default();
    state.reads.lock().await.push(query);
    let body = match action.as_str() {
        "routes" => state.routes_body.lock().await.clone(),
        "currentCheckin" => state.current_body.lock().await.clone(),
        _ => return (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    };
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_write(
    State(state): State<MockBackendState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    state.writes.lock().await.push(body);
    *state.write_status.lock().await
}

async fn spawn_backend() -> anyhow::Result<(String, MockBackendState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockBackendState::new();
    let app = Router::new()
        .route("/exec", get(handle_read).post(handle_write))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/exec"), state))
}

fn open_session_json(route: &str, mode: &str) -> serde_json::Value {
    serde_json::json!({
        "checkinId": 12,
        "checkinTime": "2026-10-17T03:30:00.000Z",
        "route": route,
        "mode": mode,
    })
}

fn client_for(endpoint: &str, name: &str) -> Arc<AttendanceClient> {
    AttendanceClient::with_http_backend(Identity::new(name), endpoint)
}

#[tokio::test]
async fn refresh_loads_routes_then_current_checkin() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("Market Road", "Bus")).await;
    let client = client_for(&endpoint, "Meera");

    let view = client.refresh().await.expect("refresh");

    assert_eq!(
        client.routes().await,
        vec!["North Loop".to_string(), "Market Road".to_string()]
    );
    assert!(view.check_out_visible);
    assert!(!view.check_in_visible);
    assert_eq!(view.checkout_fields, Some(CloseFieldSet::BusTicket));

    let reads = backend.reads.lock().await.clone();
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].get("action").map(String::as_str), Some("routes"));
    assert_eq!(reads[1].get("action").map(String::as_str), Some("currentCheckin"));
    assert_eq!(reads[1].get("salespersonName").map(String::as_str), Some("Meera"));
}

#[tokio::test]
async fn unknown_identity_is_not_sent_as_a_query_parameter() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&endpoint, "   ");

    client.reconcile().await.expect("reconcile");

    let reads = backend.reads.lock().await.clone();
    assert!(!reads[0].contains_key("salespersonName"));
    assert_eq!(client.view().await.salesperson_label, "Unknown");
}

#[tokio::test]
async fn bike_open_with_blank_reading_never_reaches_backend() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&endpoint, "Meera");

    let err = client
        .open_session(CheckinForm {
            route: "North Loop".to_string(),
            mode: Some(TravelMode::Bike),
            bike_reading: String::new(),
            bike_odo_image: Some(Attachment::from_bytes("odo.jpg", vec![1, 2])),
        })
        .await
        .expect_err("must fail");

    assert_eq!(err, ClientError::validation(FormField::BikeReading));
    assert_eq!(backend.read_count().await, 0);
    assert!(backend.writes().await.is_empty());
}

#[tokio::test]
async fn open_state_comes_from_reconciliation_not_the_payload() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&endpoint, "Meera");
    backend.set_current(open_session_json("B", "Bike")).await;

    let session = client
        .open_session(CheckinForm {
            route: "A".to_string(),
            mode: Some(TravelMode::Bike),
            bike_reading: "10200".to_string(),
            bike_odo_image: Some(Attachment::from_bytes("odo.jpg", b"odometer".to_vec())),
        })
        .await
        .expect("open")
        .expect("session");

    assert_eq!(session.route, "B");
    let view = client.view().await;
    assert_eq!(view.summary.expect("summary").route, "B");

    let writes = backend.writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["action"], "checkin");
    assert_eq!(writes[0]["route"], "A");
    assert_eq!(writes[0]["salespersonName"], "Meera");
    assert_eq!(writes[0]["bikeReading"], "10200");
    assert_eq!(writes[0]["bikeOdoImageBase64"], STANDARD.encode(b"odometer"));
}

#[tokio::test]
async fn open_that_backend_did_not_record_leaves_check_in_available() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&endpoint, "Meera");

    let session = client
        .open_session(CheckinForm {
            route: "North Loop".to_string(),
            mode: Some(TravelMode::Bus),
            ..CheckinForm::default()
        })
        .await
        .expect("open");

    assert_eq!(session, None);
    assert!(client.store_snapshot().await.can_open());
    assert_eq!(backend.writes().await.len(), 1);
}

#[tokio::test]
async fn bus_close_without_ticket_image_fails_before_network() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("Market Road", "Bus")).await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect("reconcile");
    let reads_before = backend.read_count().await;

    let err = client
        .close_session(CheckoutForm {
            bus_ticket_price: "35".to_string(),
            ..CheckoutForm::default()
        })
        .await
        .expect_err("must fail");

    assert_eq!(err.field(), Some(FormField::BusTicketImage));
    assert_eq!(backend.read_count().await, reads_before);
    assert!(backend.writes().await.is_empty());
    assert!(client.store_snapshot().await.can_close());
}

#[tokio::test]
async fn close_posts_held_session_id_and_reconciles_to_no_session() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("Ring Road", "Bike")).await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect("reconcile");
    backend.set_current(serde_json::Value::Null).await;

    let after = client
        .close_session(CheckoutForm {
            food_expense: "80".to_string(),
            auto_expense: "20".to_string(),
            bike_reading_out: "10290".to_string(),
            bike_odo_image_out: Some(Attachment::from_bytes("odo-out.jpg", vec![7, 7, 7])),
            ..CheckoutForm::default()
        })
        .await
        .expect("close");

    assert_eq!(after, None);
    let store = client.store_snapshot().await;
    assert!(store.can_open() && !store.can_close());

    let writes = backend.writes().await;
    assert_eq!(writes[0]["action"], "checkout");
    assert_eq!(writes[0]["checkinId"], "12");
    assert_eq!(writes[0]["foodExpense"], "80");
    assert_eq!(writes[0]["autoExpense"], "20");
    assert_eq!(writes[0]["bikeReadingOut"], "10290");
    assert_eq!(writes[0]["bikeOdoImageOutBase64"], STANDARD.encode([7u8, 7, 7]));
    assert!(writes[0].get("busTicketPrice").is_none());
}

#[tokio::test]
async fn sync_failure_clears_previously_held_session() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("Market Road", "Bus")).await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect("reconcile");
    assert!(client.store_snapshot().await.can_close());

    backend.set_current_raw("<html>quota exceeded</html>").await;
    let err = client.reconcile().await.expect_err("must fail");

    assert!(matches!(err, ClientError::SyncFailed(_)), "{err:?}");
    assert_eq!(client.store_snapshot().await.current(), None);
    let view = client.view().await;
    assert!(view.degraded.is_some());
    assert!(!view.check_in_visible);
    assert!(!view.check_out_visible);
}

#[tokio::test]
async fn backend_reported_failure_on_current_checkin_is_a_sync_failure() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend
        .set_current_raw(r#"{"ok":false,"error":"sheet locked"}"#)
        .await;
    let client = client_for(&endpoint, "Meera");

    let err = client.reconcile().await.expect_err("must fail");
    assert_eq!(
        err,
        ClientError::SyncFailed("backend rejected currentCheckin: sheet locked".to_string())
    );

    backend.set_current(serde_json::Value::Null).await;
    client.reconcile().await.expect("recovers");
    assert_eq!(client.degraded_reason().await, None);
    assert!(client.view().await.check_in_visible);
}

#[tokio::test]
async fn failed_submission_keeps_store_and_skips_reconcile() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("Market Road", "Other")).await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect("reconcile");
    let before = client.store_snapshot().await;
    let reads_before = backend.read_count().await;
    *backend.write_status.lock().await = StatusCode::INTERNAL_SERVER_ERROR;

    let err = client
        .close_session(CheckoutForm::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, ClientError::SubmissionFailed(_)), "{err:?}");
    assert_eq!(client.store_snapshot().await, before);
    assert_eq!(backend.read_count().await, reads_before);
}

#[tokio::test]
async fn rejected_catalog_degrades_to_empty_routes() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&endpoint, "Meera");
    client.load_routes().await.expect("first load");

    *backend.routes_body.lock().await = r#"{"ok":false,"error":"no plan for today"}"#.to_string();
    let err = client.load_routes().await.expect_err("must fail");

    assert_eq!(
        err,
        ClientError::CatalogUnavailable("no plan for today".to_string())
    );
    assert!(client.routes().await.is_empty());
    assert_eq!(
        client.view().await.route_choices,
        presentation::RouteChoices::NoneFound
    );
}

#[tokio::test]
async fn unreachable_backend_is_catalog_unavailable_and_refresh_still_reconciles() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = client_for(&format!("http://{addr}/exec"), "Meera");

    let err = client.load_routes().await.expect_err("must fail");
    assert!(matches!(err, ClientError::CatalogUnavailable(_)), "{err:?}");

    let err = client.refresh().await.expect_err("sync must fail");
    assert!(matches!(err, ClientError::SyncFailed(_)), "{err:?}");
}

#[tokio::test]
async fn events_report_submission_then_reconciled_session() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("North Loop", "Bus")).await;
    let client = client_for(&endpoint, "Meera");
    let mut rx = client.subscribe_events();

    client
        .open_session(CheckinForm {
            route: "North Loop".to_string(),
            mode: Some(TravelMode::Bus),
            ..CheckinForm::default()
        })
        .await
        .expect("open");

    match rx.recv().await.expect("event") {
        ClientEvent::Submitted(action) => assert_eq!(action, BackendAction::Checkin),
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await.expect("event") {
        ClientEvent::SessionChanged(Some(session)) => assert_eq!(session.route, "North Loop"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn check_in_is_refused_while_backend_reports_an_open_session() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current(open_session_json("North Loop", "Bus")).await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect("reconcile");

    let err = client
        .open_session(CheckinForm {
            route: "Market Road".to_string(),
            mode: Some(TravelMode::Bus),
            ..CheckinForm::default()
        })
        .await
        .expect_err("must fail");

    assert_eq!(err, ClientError::NotPermitted(SessionAction::Open));
    assert!(backend.writes().await.is_empty());
}

#[tokio::test]
async fn check_in_is_refused_until_a_failed_sync_recovers() {
    let (endpoint, backend) = spawn_backend().await.expect("spawn backend");
    backend.set_current_raw("<html>quota exceeded</html>").await;
    let client = client_for(&endpoint, "Meera");
    client.reconcile().await.expect_err("must fail");
    assert!(client.store_snapshot().await.can_open());

    let form = CheckinForm {
        route: "Market Road".to_string(),
        mode: Some(TravelMode::Bus),
        ..CheckinForm::default()
    };
    let err = client
        .open_session(form.clone())
        .await
        .expect_err("must fail");
    assert_eq!(err, ClientError::NotPermitted(SessionAction::Open));
    assert!(backend.writes().await.is_empty());

    backend.set_current(serde_json::Value::Null).await;
    client.reconcile().await.expect("reconcile");
    backend.set_current(open_session_json("Market Road", "Bus")).await;
    let held = client.open_session(form).await.expect("open");
    assert!(held.is_some());
    assert_eq!(backend.writes().await.len(), 1);
}
