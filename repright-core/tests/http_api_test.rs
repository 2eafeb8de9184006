use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use repright::session::HistoryDirection;
use repright::{ApiConfig, HistoryBrowser, SessionError, WorkoutApi, WorkoutSessionController, WorkoutStatus};

/// Stand-in for the rep-counting backend.
#[derive(Default)]
struct Backend {
    next_workout_id: AtomicUsize,
    start_hits: AtomicUsize,
    start_delay_ms: u64,
    captures: Mutex<Vec<(&'static str, Value)>>,
    store_failures: AtomicUsize,
    stored: Mutex<Vec<Value>>,
    history_queries: Mutex<Vec<HashMap<String, String>>>,
}

async fn start_workout(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.start_hits.fetch_add(1, Ordering::SeqCst);
    if backend.start_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(backend.start_delay_ms)).await;
    }
    let id = backend.next_workout_id.fetch_add(1, Ordering::SeqCst) + 7;
    Json(json!({ "workout_id": id }))
}

async fn start_exercise(State(backend): State<Arc<Backend>>) -> impl IntoResponse {
    let mut captures = backend.captures.lock().unwrap();
    if captures.is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, "camera busy").into_response();
    }
    let (name, reps) = captures.remove(0);
    Json(json!({ "exercise_name": name, "rep_count": reps })).into_response()
}

async fn store_exercise_reps(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let remaining = backend.store_failures.load(Ordering::SeqCst);
    if remaining > 0 {
        backend.store_failures.store(remaining - 1, Ordering::SeqCst);
        return (StatusCode::INTERNAL_SERVER_ERROR, "db down").into_response();
    }
    backend.stored.lock().unwrap().push(body);
    (StatusCode::OK, "Exercise reps stored successfully").into_response()
}

async fn workouts(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.history_queries.lock().unwrap().push(params.clone());
    let page = match params.get("direction").map(String::as_str) {
        Some("recent") => json!({
            "workout": [7, "Tue, 15 Oct 2024 10:00:00 GMT"],
            "exercises": [["squat", "12"], ["pushup", 8]]
        }),
        Some("prev") if params.get("workout_id").map(String::as_str) == Some("7") => json!({
            "workout": [6, "Mon, 14 Oct 2024 10:00:00 GMT"],
            "exercises": []
        }),
        _ => Value::Null,
    };
    Json(page)
}

async fn serve(backend: Arc<Backend>) -> SocketAddr {
    let app = Router::new()
        .route("/start_workout", post(start_workout))
        .route("/start_exercise", post(start_exercise))
        .route("/store_exercise_reps", post(store_exercise_reps))
        .route("/workouts", get(workouts))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn controller(addr: SocketAddr, timeout: Duration) -> WorkoutSessionController {
    let config = ApiConfig::new(&format!("http://{}", addr))
        .unwrap()
        .with_timeout(timeout)
        .unwrap();
    WorkoutSessionController::from_config(config).unwrap()
}

#[tokio::test]
async fn session_round_trip_over_http() {
    let backend = Arc::new(Backend {
        captures: Mutex::new(vec![("squat", json!("12")), ("pushup", json!("8"))]),
        ..Default::default()
    });
    let addr = serve(backend.clone()).await;
    let controller = controller(addr, Duration::from_secs(5));

    assert_eq!(controller.start_session().await.unwrap(), 7);
    controller.capture_exercise().await.unwrap();
    controller.capture_exercise().await.unwrap();
    controller.stop_session().await.unwrap();

    assert_eq!(
        *backend.stored.lock().unwrap(),
        vec![json!({
            "workout_id": 7,
            "exercises": [[7, "squat", 12], [7, "pushup", 8]]
        })]
    );
    let state = controller.current_state();
    assert_eq!(state.status, WorkoutStatus::Idle);
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn http_errors_keep_session_for_retry() {
    let backend = Arc::new(Backend {
        captures: Mutex::new(vec![("squat", json!(3))]),
        store_failures: AtomicUsize::new(1),
        ..Default::default()
    });
    let addr = serve(backend.clone()).await;
    let controller = controller(addr, Duration::from_secs(5));

    controller.start_session().await.unwrap();
    controller.capture_exercise().await.unwrap();

    // The backend has no more scripted captures and answers 503.
    let err = controller.capture_exercise().await.unwrap_err();
    assert!(matches!(err, SessionError::HttpStatus { status: 503, .. }));
    assert_eq!(controller.current_state().results.len(), 1);

    let err = controller.stop_session().await.unwrap_err();
    assert!(matches!(err, SessionError::HttpStatus { status: 500, .. }));
    let state = controller.current_state();
    assert_eq!(state.status, WorkoutStatus::Active);
    assert!(state.submission_pending);

    controller.stop_session().await.unwrap();
    assert_eq!(
        *backend.stored.lock().unwrap(),
        vec![json!({ "workout_id": 7, "exercises": [[7, "squat", 3]] })]
    );
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_error() {
    let backend = Arc::new(Backend {
        start_delay_ms: 2_000,
        ..Default::default()
    });
    let addr = serve(backend).await;
    let controller = controller(addr, Duration::from_millis(200));

    let err = controller.start_session().await.unwrap_err();
    match &err {
        SessionError::Transport { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(controller.current_state().status, WorkoutStatus::Idle);
}

#[tokio::test]
async fn concurrent_starts_are_serialized() {
    let backend = Arc::new(Backend {
        start_delay_ms: 100,
        ..Default::default()
    });
    let addr = serve(backend.clone()).await;
    let controller = controller(addr, Duration::from_secs(5));

    let (first, second) = tokio::join!(controller.start_session(), controller.start_session());

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(e) if e.is_invalid_state()))
    );
    assert_eq!(backend.start_hits.load(Ordering::SeqCst), 1);
    assert_eq!(controller.current_state().workout_id, Some(7));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let controller = controller(addr, Duration::from_secs(2));

    let err = controller.start_session().await.unwrap_err();
    assert!(matches!(err, SessionError::Transport { .. }));
    assert_eq!(controller.current_state().workout_id, None);
}

#[tokio::test]
async fn history_pages_by_workout_id() {
    let backend = Arc::new(Backend::default());
    let addr = serve(backend.clone()).await;
    let api = Arc::new(
        WorkoutApi::new_http(ApiConfig::new(&format!("http://{}", addr)).unwrap()).unwrap(),
    );

    let mut history = HistoryBrowser::new(api.clone());
    let recent = history.recent().await.unwrap().unwrap().clone();
    assert_eq!(recent.workout_id, 7);
    assert_eq!(recent.total_reps(), 20);

    assert_eq!(history.prev().await.unwrap().unwrap().workout_id, 6);
    assert!(history.prev().await.unwrap().is_none());
    assert_eq!(history.current().unwrap().workout_id, 6);

    assert!(
        api.fetch_workout(HistoryDirection::Next, Some(7))
            .await
            .unwrap()
            .is_none()
    );

    let queries = backend.history_queries.lock().unwrap();
    assert_eq!(queries[0].get("direction").map(String::as_str), Some("recent"));
    assert!(!queries[0].contains_key("workout_id"));
    assert_eq!(queries[1].get("workout_id").map(String::as_str), Some("7"));
}
