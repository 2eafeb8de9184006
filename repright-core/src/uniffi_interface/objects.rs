use crate::session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum WorkoutStatus {
    Idle,
    Active,
}

impl From<session::WorkoutStatus> for WorkoutStatus {
    fn from(s: session::WorkoutStatus) -> Self {
        match s {
            session::WorkoutStatus::Idle => WorkoutStatus::Idle,
            session::WorkoutStatus::Active => WorkoutStatus::Active,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ExerciseResult {
    pub workout_id: i64,
    pub exercise_name: String,
    pub rep_count: u32,
}

impl From<session::ExerciseResult> for ExerciseResult {
    fn from(r: session::ExerciseResult) -> Self {
        ExerciseResult {
            workout_id: r.workout_id,
            exercise_name: r.exercise_name,
            rep_count: r.rep_count,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionState {
    pub status: WorkoutStatus,
    pub workout_id: Option<i64>,
    pub results: Vec<ExerciseResult>,
    pub submission_pending: bool,
}

impl From<session::SessionState> for SessionState {
    fn from(s: session::SessionState) -> Self {
        SessionState {
            status: s.status.into(),
            workout_id: s.workout_id,
            results: s.results.into_iter().map(ExerciseResult::from).collect(),
            submission_pending: s.submission_pending,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ExerciseTotal {
    pub exercise_name: String,
    pub rep_count: u64,
}

#[derive(uniffi::Object)]
pub struct WorkoutPage {
    workout_id: i64,
    performed_at: String,
    performed_at_unix: Option<i64>,
    exercises: Vec<ExerciseTotal>,
    totals: Vec<ExerciseTotal>,
}

#[uniffi::export]
impl WorkoutPage {
    fn workout_id(&self) -> i64 {
        self.workout_id
    }

    fn performed_at(&self) -> String {
        self.performed_at.clone()
    }

    /// Seconds since the epoch, when the backend timestamp could be parsed.
    fn performed_at_unix(&self) -> Option<i64> {
        self.performed_at_unix
    }

    fn exercises(&self) -> Vec<ExerciseTotal> {
        self.exercises.clone()
    }

    fn reps_by_exercise(&self) -> Vec<ExerciseTotal> {
        self.totals.clone()
    }

    fn total_reps(&self) -> u64 {
        self.totals.iter().map(|t| t.rep_count).sum()
    }
}

impl From<&session::WorkoutPage> for WorkoutPage {
    fn from(p: &session::WorkoutPage) -> Self {
        WorkoutPage {
            workout_id: p.workout_id,
            performed_at: p.performed_at.clone(),
            performed_at_unix: p
                .performed_at_datetime()
                .map(|dt| dt.and_utc().timestamp()),
            exercises: p
                .exercises
                .iter()
                .map(|e| ExerciseTotal {
                    exercise_name: e.exercise_name.clone(),
                    rep_count: u64::from(e.rep_count),
                })
                .collect(),
            totals: p
                .reps_by_exercise()
                .into_iter()
                .map(|(exercise_name, rep_count)| ExerciseTotal {
                    exercise_name,
                    rep_count,
                })
                .collect(),
        }
    }
}
