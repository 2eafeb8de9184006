//! JSON shapes exchanged with the Workout API.

use serde::{Deserialize, Deserializer, Serialize};

/// A repetition count as the backend sends it: an integer, or the same number as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepCount(pub u32);

impl<'de> Deserialize<'de> for RepCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IntFloatOrText {
            Int(i64),
            Float(f64),
            Text(String),
        }

        let count = match IntFloatOrText::deserialize(deserializer)? {
            IntFloatOrText::Int(i) => i,
            IntFloatOrText::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    f as i64
                } else {
                    return Err(Error::custom(format!("invalid rep_count value: {}", f)));
                }
            }
            IntFloatOrText::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::custom(format!("rep_count is not an integer: {:?}", s)))?,
        };

        u32::try_from(count)
            .map(RepCount)
            .map_err(|_| Error::custom(format!("rep_count out of range: {}", count)))
    }
}

#[derive(Debug, Deserialize)]
pub struct StartWorkoutResponse {
    pub workout_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StartExerciseResponse {
    pub exercise_name: String,
    pub rep_count: RepCount,
}

#[derive(Debug, Serialize)]
pub struct StoreExerciseRepsRequest<'a> {
    pub workout_id: i64,
    pub exercises: Vec<(i64, &'a str, u32)>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutPageResponse {
    pub workout: (i64, String),
    #[serde(default)]
    pub exercises: Vec<(String, RepCount)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_count_accepts_numbers_and_text() {
        let parsed: StartExerciseResponse =
            serde_json::from_str(r#"{"exercise_name":"squat","rep_count":" 12 "}"#).unwrap();
        assert_eq!(parsed.rep_count, RepCount(12));

        let parsed: StartExerciseResponse =
            serde_json::from_str(r#"{"exercise_name":"push up","rep_count":8}"#).unwrap();
        assert_eq!(parsed.rep_count, RepCount(8));

        let parsed: StartExerciseResponse =
            serde_json::from_str(r#"{"exercise_name":"push up","rep_count":3.0}"#).unwrap();
        assert_eq!(parsed.rep_count, RepCount(3));
    }

    #[test]
    fn rep_count_rejects_garbage() {
        for body in [
            r#"{"exercise_name":"squat","rep_count":"twelve"}"#,
            r#"{"exercise_name":"squat","rep_count":"-1"}"#,
            r#"{"exercise_name":"squat","rep_count":2.5}"#,
            r#"{"exercise_name":"squat","rep_count":null}"#,
            r#"{"exercise_name":"squat"}"#,
        ] {
            assert!(
                serde_json::from_str::<StartExerciseResponse>(body).is_err(),
                "accepted {}",
                body
            );
        }
    }

    #[test]
    fn store_request_uses_nested_arrays() {
        let request = StoreExerciseRepsRequest {
            workout_id: 7,
            exercises: vec![(7, "squat", 12), (7, "pushup", 8)],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "workout_id": 7,
                "exercises": [[7, "squat", 12], [7, "pushup", 8]]
            })
        );
    }

    #[test]
    fn workout_page_parses_tuple_rows() {
        let page: Option<WorkoutPageResponse> = serde_json::from_str(
            r#"{"workout":[3,"Tue, 15 Oct 2024 10:00:00 GMT"],"exercises":[["squat","10"],["push up",5]]}"#,
        )
        .unwrap();
        let page = page.unwrap();
        assert_eq!(page.workout.0, 3);
        assert_eq!(page.exercises[0], ("squat".to_string(), RepCount(10)));

        let missing: Option<WorkoutPageResponse> = serde_json::from_str("null").unwrap();
        assert!(missing.is_none());
    }
}
