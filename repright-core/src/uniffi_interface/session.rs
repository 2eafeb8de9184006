use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::*;
use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::SessionError;
use crate::session::{HistoryBrowser, WorkoutSessionController};
use crate::uniffi_interface::errors::RepRightError;
use crate::uniffi_interface::objects::{ExerciseResult, SessionState, WorkoutPage};

#[derive(uniffi::Object)]
pub struct RepRightSession {
    controller: Arc<WorkoutSessionController>,
    history: Arc<Mutex<HistoryBrowser>>,
}

/// Runs `fut` on the global runtime, where the HTTP client has a reactor,
/// whatever executor the foreign caller polls us from.
async fn on_runtime<T, F>(fut: F) -> Result<T, RepRightError>
where
    F: Future<Output = Result<T, SessionError>> + Send + 'static,
    T: Send + 'static,
{
    let rt = crate::runtime::global_runtime()?;
    Ok(rt.spawn(fut).await??)
}

#[uniffi::export]
pub fn create_session(
    base_url: &str,
    timeout_secs: Option<u32>,
) -> Result<Arc<RepRightSession>, RepRightError> {
    let mut config = ApiConfig::new(base_url)?;
    if let Some(secs) = timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs.into()))?;
    }
    debug!("Creating session against {}", config.base_url);

    let controller = Arc::new(WorkoutSessionController::from_config(config)?);
    let history = HistoryBrowser::new(controller.api());
    Ok(Arc::new(RepRightSession {
        controller,
        history: Arc::new(Mutex::new(history)),
    }))
}

#[uniffi::export]
pub fn current_state(session: &RepRightSession) -> SessionState {
    session.controller.current_state().into()
}

#[uniffi::export]
pub async fn start_workout(session: Arc<RepRightSession>) -> Result<i64, RepRightError> {
    let controller = Arc::clone(&session.controller);
    on_runtime(async move { controller.start_session().await }).await
}

#[uniffi::export]
pub async fn capture_exercise(
    session: Arc<RepRightSession>,
) -> Result<ExerciseResult, RepRightError> {
    let controller = Arc::clone(&session.controller);
    let result = on_runtime(async move { controller.capture_exercise().await }).await?;
    Ok(result.into())
}

#[uniffi::export]
pub async fn stop_workout(
    session: Arc<RepRightSession>,
) -> Result<Vec<ExerciseResult>, RepRightError> {
    let controller = Arc::clone(&session.controller);
    let submitted = on_runtime(async move { controller.stop_session().await }).await?;
    Ok(submitted.into_iter().map(ExerciseResult::from).collect())
}

#[uniffi::export]
pub async fn load_recent_workout(
    session: Arc<RepRightSession>,
) -> Result<Option<Arc<WorkoutPage>>, RepRightError> {
    let history = Arc::clone(&session.history);
    let page = on_runtime(async move {
        let mut history = history.lock().await;
        Ok(history.recent().await?.map(WorkoutPage::from))
    })
    .await?;
    Ok(page.map(Arc::new))
}

#[uniffi::export]
pub async fn load_next_workout(
    session: Arc<RepRightSession>,
) -> Result<Option<Arc<WorkoutPage>>, RepRightError> {
    let history = Arc::clone(&session.history);
    let page = on_runtime(async move {
        let mut history = history.lock().await;
        Ok(history.next().await?.map(WorkoutPage::from))
    })
    .await?;
    Ok(page.map(Arc::new))
}

#[uniffi::export]
pub async fn load_previous_workout(
    session: Arc<RepRightSession>,
) -> Result<Option<Arc<WorkoutPage>>, RepRightError> {
    let history = Arc::clone(&session.history);
    let page = on_runtime(async move {
        let mut history = history.lock().await;
        Ok(history.prev().await?.map(WorkoutPage::from))
    })
    .await?;
    Ok(page.map(Arc::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_a_config_error() {
        assert!(matches!(
            create_session("http://localhost:5000", Some(0)),
            Err(RepRightError::Config(_))
        ));
        assert!(create_session("http://localhost:5000", Some(5)).is_ok());
    }
}
