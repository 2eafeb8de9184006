use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkoutStatus {
    #[default]
    Idle,
    Active,
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutStatus::Idle => write!(f, "idle"),
            WorkoutStatus::Active => write!(f, "active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseResult {
    pub workout_id: i64,
    pub exercise_name: String,
    pub rep_count: u32,
}

impl fmt::Display for ExerciseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} reps", self.exercise_name, self.rep_count)
    }
}

/// Snapshot of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub status: WorkoutStatus,
    pub workout_id: Option<i64>,
    pub results: Vec<ExerciseResult>,
    /// Set after a failed submission; cleared once one succeeds.
    pub submission_pending: bool,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        self.status == WorkoutStatus::Active
    }

    pub fn total_reps(&self) -> u64 {
        self.results.iter().map(|r| u64::from(r.rep_count)).sum()
    }
}
