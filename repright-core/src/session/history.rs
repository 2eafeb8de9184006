use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use log::{debug, info};

use crate::api::WorkoutApi;
use crate::error::{Operation, Result, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Next,
    Prev,
    Recent,
}

impl HistoryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryDirection::Next => "next",
            HistoryDirection::Prev => "prev",
            HistoryDirection::Recent => "recent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseReps {
    pub exercise_name: String,
    pub rep_count: u32,
}

/// One past workout with the exercises recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutPage {
    pub workout_id: i64,
    /// Timestamp exactly as the backend rendered it.
    pub performed_at: String,
    pub exercises: Vec<ExerciseReps>,
}

impl WorkoutPage {
    pub fn performed_at_datetime(&self) -> Option<NaiveDateTime> {
        let raw = self.performed_at.trim();
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok())
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok())
    }

    /// Summed as `u64`; single counts may be as large as `u32::MAX`.
    pub fn total_reps(&self) -> u64 {
        self.exercises.iter().map(|e| u64::from(e.rep_count)).sum()
    }

    /// Reps summed per exercise, in the order each exercise first appears.
    pub fn reps_by_exercise(&self) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::new();
        for entry in &self.exercises {
            match totals.iter_mut().find(|(name, _)| *name == entry.exercise_name) {
                Some((_, reps)) => *reps += u64::from(entry.rep_count),
                None => totals.push((entry.exercise_name.clone(), u64::from(entry.rep_count))),
            }
        }
        totals
    }
}

/// Pages through past workouts one at a time, keyed by workout id.
pub struct HistoryBrowser {
    api: Arc<WorkoutApi>,
    current: Option<WorkoutPage>,
}

impl HistoryBrowser {
    pub fn new(api: Arc<WorkoutApi>) -> Self {
        Self { api, current: None }
    }

    pub fn current(&self) -> Option<&WorkoutPage> {
        self.current.as_ref()
    }

    pub async fn recent(&mut self) -> Result<Option<&WorkoutPage>> {
        let page = self.api.fetch_workout(HistoryDirection::Recent, None).await?;
        match &page {
            Some(p) => info!("Loaded most recent workout {}", p.workout_id),
            None => info!("No workouts recorded yet"),
        }
        self.current = page;
        Ok(self.current.as_ref())
    }

    pub async fn next(&mut self) -> Result<Option<&WorkoutPage>> {
        self.step(HistoryDirection::Next).await
    }

    pub async fn prev(&mut self) -> Result<Option<&WorkoutPage>> {
        self.step(HistoryDirection::Prev).await
    }

    /// Moves one workout in `direction`. At either end the current page is kept
    /// and `None` is returned.
    async fn step(&mut self, direction: HistoryDirection) -> Result<Option<&WorkoutPage>> {
        let Some(from) = self.current.as_ref().map(|p| p.workout_id) else {
            return Err(SessionError::invalid_state(
                Operation::PageHistory,
                "no workout loaded to page from",
            ));
        };

        match self.api.fetch_workout(direction, Some(from)).await? {
            Some(page) => {
                debug!(
                    "Paged {} from workout {} to {}",
                    direction.as_str(),
                    from,
                    page.workout_id
                );
                self.current = Some(page);
                Ok(self.current.as_ref())
            }
            None => {
                debug!("No workout {} of {}", direction.as_str(), from);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoint, MockReply};
    use serde_json::json;

    fn page_json(id: i64) -> serde_json::Value {
        json!({
            "workout": [id, format!("2024-10-{:02} 09:30:00", id)],
            "exercises": [["squat", "10"], ["push up", 5], ["squat", 8]]
        })
    }

    /// Backend holding workouts 1..=3.
    fn browser() -> HistoryBrowser {
        let api = WorkoutApi::new_mock_fn(|request| {
            assert_eq!(request.endpoint, Endpoint::Workouts);
            let direction = request
                .query
                .iter()
                .find(|(k, _)| *k == "direction")
                .map(|(_, v)| v.as_str());
            let from = request
                .query
                .iter()
                .find(|(k, _)| *k == "workout_id")
                .and_then(|(_, v)| v.parse::<i64>().ok());
            let target = match (direction, from) {
                (Some("recent"), None) => Some(3),
                (Some("next"), Some(id)) if id < 3 => Some(id + 1),
                (Some("prev"), Some(id)) if id > 1 => Some(id - 1),
                (Some("next" | "prev"), Some(_)) => None,
                _ => return MockReply::Status(400),
            };
            MockReply::Json(target.map(page_json).unwrap_or(serde_json::Value::Null))
        });
        HistoryBrowser::new(Arc::new(api))
    }

    #[tokio::test]
    async fn pages_by_workout_id_and_holds_at_the_ends() {
        let mut history = browser();

        let err = history.next().await.unwrap_err();
        assert!(err.is_invalid_state());

        assert_eq!(history.recent().await.unwrap().unwrap().workout_id, 3);
        assert!(history.next().await.unwrap().is_none());
        assert_eq!(history.current().unwrap().workout_id, 3);

        assert_eq!(history.prev().await.unwrap().unwrap().workout_id, 2);
        assert_eq!(history.prev().await.unwrap().unwrap().workout_id, 1);
        assert!(history.prev().await.unwrap().is_none());
        assert_eq!(history.current().unwrap().workout_id, 1);
        assert_eq!(history.next().await.unwrap().unwrap().workout_id, 2);
    }

    #[tokio::test]
    async fn aggregates_reps_for_charting() {
        let mut history = browser();
        let page = history.recent().await.unwrap().unwrap().clone();

        assert_eq!(page.total_reps(), 23);
        assert_eq!(
            page.reps_by_exercise(),
            vec![("squat".to_string(), 18), ("push up".to_string(), 5)]
        );
        assert_eq!(
            page.performed_at_datetime().unwrap().to_string(),
            "2024-10-03 09:30:00"
        );
    }

    #[tokio::test]
    async fn huge_counts_sum_without_overflow() {
        let api = WorkoutApi::new_mock_fn(|_| {
            MockReply::Json(json!({
                "workout": [1, "2024-10-01 09:30:00"],
                "exercises": [["squat", "3000000000"], ["squat", "3000000000"]]
            }))
        });
        let mut history = HistoryBrowser::new(Arc::new(api));
        let page = history.recent().await.unwrap().unwrap();

        assert_eq!(page.exercises[0].rep_count, 3_000_000_000);
        assert_eq!(page.total_reps(), 6_000_000_000);
        assert_eq!(
            page.reps_by_exercise(),
            vec![("squat".to_string(), 6_000_000_000)]
        );
    }

    #[test]
    fn parses_flask_http_dates() {
        let page = WorkoutPage {
            workout_id: 1,
            performed_at: "Tue, 15 Oct 2024 10:00:00 GMT".into(),
            exercises: vec![],
        };
        assert_eq!(
            page.performed_at_datetime().unwrap().to_string(),
            "2024-10-15 10:00:00"
        );
    }
}
