use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::api::WorkoutApi;
use crate::config::ApiConfig;
use crate::error::{Operation, Result, SessionError};
use crate::session::state::{ExerciseResult, SessionState, WorkoutStatus};

/// Owns one workout session at a time and serializes every call that mutates it.
///
/// Mutating operations hold `op_lock` across the whole check, request and
/// commit sequence, so a second call waits for the first to resolve and then
/// sees its outcome. Reads go through `state` only and never wait on the network.
pub struct WorkoutSessionController {
    api: Arc<WorkoutApi>,
    op_lock: Mutex<()>,
    state: RwLock<SessionState>,
}

impl WorkoutSessionController {
    pub fn new(api: Arc<WorkoutApi>) -> Self {
        Self {
            api,
            op_lock: Mutex::new(()),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn from_config(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(WorkoutApi::new_http(config)?)))
    }

    pub fn api(&self) -> Arc<WorkoutApi> {
        Arc::clone(&self.api)
    }

    pub fn current_state(&self) -> SessionState {
        self.state.read().clone()
    }

    fn require_status(&self, operation: Operation, expected: WorkoutStatus) -> Result<()> {
        let status = self.state.read().status;
        if status != expected {
            warn!("Rejected {} while session is {}", operation, status);
            return Err(SessionError::invalid_state(
                operation,
                format!("session is {}, expected {}", status, expected),
            ));
        }
        Ok(())
    }

    /// Starts a new workout on the backend and returns its id.
    pub async fn start_session(&self) -> Result<i64> {
        let _guard = self.op_lock.lock().await;
        self.require_status(Operation::StartSession, WorkoutStatus::Idle)?;

        let workout_id = self.api.start_workout().await?;

        let mut state = self.state.write();
        state.status = WorkoutStatus::Active;
        state.workout_id = Some(workout_id);
        state.results.clear();
        state.submission_pending = false;
        info!("Workout {} started", workout_id);
        Ok(workout_id)
    }

    /// Runs one backend capture and appends its result to the session.
    pub async fn capture_exercise(&self) -> Result<ExerciseResult> {
        let _guard = self.op_lock.lock().await;
        self.require_status(Operation::CaptureExercise, WorkoutStatus::Active)?;
        let Some(workout_id) = self.state.read().workout_id else {
            return Err(SessionError::invalid_state(
                Operation::CaptureExercise,
                "active session has no workout id",
            ));
        };

        let captured = self.api.start_exercise().await?;
        let result = ExerciseResult {
            workout_id,
            exercise_name: captured.exercise_name,
            rep_count: captured.rep_count,
        };

        let mut state = self.state.write();
        state.results.push(result.clone());
        debug!(
            "Workout {} captured {} ({} results so far)",
            workout_id,
            result,
            state.results.len()
        );
        Ok(result)
    }

    /// Submits every captured result in one batch and ends the session.
    ///
    /// On failure nothing is cleared, so calling this again resubmits the same batch.
    pub async fn stop_session(&self) -> Result<Vec<ExerciseResult>> {
        let _guard = self.op_lock.lock().await;
        self.require_status(Operation::StopSession, WorkoutStatus::Active)?;
        let (workout_id, results) = {
            let state = self.state.read();
            match state.workout_id {
                Some(id) => (id, state.results.clone()),
                None => {
                    return Err(SessionError::invalid_state(
                        Operation::StopSession,
                        "active session has no workout id",
                    ));
                }
            }
        };

        if let Err(e) = self.api.store_exercise_reps(workout_id, &results).await {
            warn!(
                "Submission of workout {} failed, keeping {} results: {}",
                workout_id,
                results.len(),
                e
            );
            self.state.write().submission_pending = true;
            return Err(e);
        }

        *self.state.write() = SessionState::default();
        info!(
            "Workout {} stopped with {} results submitted",
            workout_id,
            results.len()
        );
        Ok(results)
    }
}
