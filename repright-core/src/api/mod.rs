//! Client for the remote Workout API.
//!
//! The backend does the recognition and counting; this module only knows the
//! four endpoints, their JSON shapes, and how failures map onto `SessionError`.
//! An in-process mock backend stands in for the HTTP one in tests.

pub mod wire;

use std::fmt;
use std::sync::Arc;

use log::{debug, error, info, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{Result, SessionError};
use crate::session::{ExerciseResult, ExerciseReps, HistoryDirection, WorkoutPage};
use wire::{
    StartExerciseResponse, StartWorkoutResponse, StoreExerciseRepsRequest, WorkoutPageResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    StartWorkout,
    StartExercise,
    StoreExerciseReps,
    Workouts,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::StartWorkout => "start_workout",
            Endpoint::StartExercise => "start_exercise",
            Endpoint::StoreExerciseReps => "store_exercise_reps",
            Endpoint::Workouts => "workouts",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Workouts => Method::GET,
            _ => Method::POST,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method(), self.path())
    }
}

/// One outgoing call, as seen by either backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            query: vec![],
            body: None,
        }
    }
}

/// What the mock backend answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Status(u16),
    Unreachable(String),
}

type MockFn = Arc<dyn Fn(&ApiRequest) -> MockReply + Send + Sync>;

enum ApiBackend {
    Http { client: Client, config: ApiConfig },
    Mock { responder: MockFn },
}

/// Exercise name and count returned by one capture, before it is tagged with a workout id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedExercise {
    pub exercise_name: String,
    pub rep_count: u32,
}

pub struct WorkoutApi {
    backend: ApiBackend,
}

impl WorkoutApi {
    pub fn new_http(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Config(format!("failed to build HTTP client: {}", e)))?;
        info!(
            "WorkoutApi::new_http base_url={} timeout={:?}",
            config.base_url, config.timeout
        );
        Ok(Self {
            backend: ApiBackend::Http { client, config },
        })
    }

    pub fn new_mock_fn(f: impl Fn(&ApiRequest) -> MockReply + Send + Sync + 'static) -> Self {
        debug!("WorkoutApi::new_mock_fn creating mock backend");
        Self {
            backend: ApiBackend::Mock {
                responder: Arc::new(f),
            },
        }
    }

    /// Sends `request` and returns the raw body of a 2xx response.
    async fn send(&self, request: ApiRequest) -> Result<String> {
        let endpoint = request.endpoint;
        debug!("WorkoutApi::send {} query={:?}", endpoint, request.query);

        match &self.backend {
            ApiBackend::Http { client, config } => {
                let url = config.endpoint_url(endpoint.path())?;
                let mut builder = client.request(endpoint.method(), url);
                if !request.query.is_empty() {
                    builder = builder.query(&request.query);
                }
                if let Some(body) = &request.body {
                    builder = builder.json(body);
                }

                let response = builder.send().await.map_err(|e| {
                    let reason = if e.is_timeout() {
                        format!("timed out after {:?}", config.timeout)
                    } else {
                        e.to_string()
                    };
                    error!("{} failed: {}", endpoint, reason);
                    SessionError::Transport { endpoint, reason }
                })?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    error!("{} returned HTTP {}: {}", endpoint, status, text);
                    return Err(SessionError::HttpStatus {
                        endpoint,
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|e| {
                    error!("{} body could not be read: {}", endpoint, e);
                    SessionError::Transport {
                        endpoint,
                        reason: e.to_string(),
                    }
                })
            }
            ApiBackend::Mock { responder } => match responder(&request) {
                MockReply::Json(value) => Ok(value.to_string()),
                MockReply::Status(status) if (200..300).contains(&status) => Ok(String::new()),
                MockReply::Status(status) => {
                    warn!("Mock {} returned HTTP {}", endpoint, status);
                    Err(SessionError::HttpStatus { endpoint, status })
                }
                MockReply::Unreachable(reason) => {
                    warn!("Mock {} unreachable: {}", endpoint, reason);
                    Err(SessionError::Transport { endpoint, reason })
                }
            },
        }
    }

    async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let endpoint = request.endpoint;
        let raw = self.send(request).await?;
        serde_json::from_str(&raw).map_err(|e| {
            error!("Cannot parse {} response: {} -- error: {}", endpoint, raw, e);
            SessionError::malformed(endpoint, e)
        })
    }

    pub async fn start_workout(&self) -> Result<i64> {
        let response: StartWorkoutResponse =
            self.send_json(ApiRequest::new(Endpoint::StartWorkout)).await?;
        debug!("start_workout returned workout_id={}", response.workout_id);
        Ok(response.workout_id)
    }

    pub async fn start_exercise(&self) -> Result<CapturedExercise> {
        let response: StartExerciseResponse =
            self.send_json(ApiRequest::new(Endpoint::StartExercise)).await?;
        if response.exercise_name.trim().is_empty() {
            return Err(SessionError::malformed(
                Endpoint::StartExercise,
                "empty exercise_name",
            ));
        }
        Ok(CapturedExercise {
            exercise_name: response.exercise_name,
            rep_count: response.rep_count.0,
        })
    }

    /// Submits a whole session. Only the status of the response matters.
    pub async fn store_exercise_reps(
        &self,
        workout_id: i64,
        results: &[ExerciseResult],
    ) -> Result<()> {
        let payload = StoreExerciseRepsRequest {
            workout_id,
            exercises: results
                .iter()
                .map(|r| (r.workout_id, r.exercise_name.as_str(), r.rep_count))
                .collect(),
        };
        let body = serde_json::to_value(&payload)
            .map_err(|e| SessionError::Config(format!("cannot encode submission: {}", e)))?;

        let mut request = ApiRequest::new(Endpoint::StoreExerciseReps);
        request.body = Some(body);
        self.send(request).await?;
        info!(
            "Stored {} exercise results for workout {}",
            results.len(),
            workout_id
        );
        Ok(())
    }

    /// Returns `None` when the backend has no workout in that direction.
    pub async fn fetch_workout(
        &self,
        direction: HistoryDirection,
        workout_id: Option<i64>,
    ) -> Result<Option<WorkoutPage>> {
        let mut request = ApiRequest::new(Endpoint::Workouts);
        request
            .query
            .push(("direction", direction.as_str().to_string()));
        if let Some(id) = workout_id {
            request.query.push(("workout_id", id.to_string()));
        }

        let response: Option<WorkoutPageResponse> = self.send_json(request).await?;
        Ok(response.map(|page| WorkoutPage {
            workout_id: page.workout.0,
            performed_at: page.workout.1,
            exercises: page
                .exercises
                .into_iter()
                .map(|(exercise_name, reps)| ExerciseReps {
                    exercise_name,
                    rep_count: reps.0,
                })
                .collect(),
        }))
    }
}
