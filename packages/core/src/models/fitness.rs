//! Fitness tracker models: user profile, weight log and workouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::required;
use super::ValidationError;

/// Default number of rows returned by history listings
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Upper bound on rows returned by history listings
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Clamp a caller-supplied history limit into `1..=MAX_HISTORY_LIMIT`.
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("heightCm", self.height_cm)?;
        positive("weightKg", self.weight_kg)?;
        Ok(())
    }
}

/// Result of a profile update, including whether the weight log side effect landed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateOutcome {
    pub profile: Profile,
    pub weight_logged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub id: String,
    pub user_id: String,
    pub weight_kg: f64,
    pub logged_at: DateTime<Utc>,
}

impl WeightEntry {
    pub fn new(user_id: impl Into<String>, weight_kg: f64, logged_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            weight_kg,
            logged_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub exercise: String,
    pub sets: i64,
    pub reps: i64,
    pub weight_kg: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub performed_at: DateTime<Utc>,
}

/// Request payload for logging a workout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub reps: i64,
    pub weight_kg: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub performed_at: Option<DateTime<Utc>>,
}

impl NewWorkout {
    pub fn into_workout(self, now: DateTime<Utc>) -> Result<Workout, ValidationError> {
        let user_id = required("userId", &self.user_id)?;
        let exercise = required("exercise", &self.exercise)?;

        if self.sets < 1 {
            return Err(ValidationError::invalid_value("sets", "must be at least 1"));
        }
        if self.reps < 1 {
            return Err(ValidationError::invalid_value("reps", "must be at least 1"));
        }
        positive("weightKg", self.weight_kg)?;
        if matches!(self.duration_minutes, Some(minutes) if minutes < 0) {
            return Err(ValidationError::invalid_value(
                "durationMinutes",
                "must not be negative",
            ));
        }

        Ok(Workout {
            id: Uuid::new_v4().to_string(),
            user_id,
            exercise,
            sets: self.sets,
            reps: self.reps,
            weight_kg: self.weight_kg,
            duration_minutes: self.duration_minutes,
            performed_at: self.performed_at.unwrap_or(now),
        })
    }
}

fn positive(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => {
            Err(ValidationError::invalid_value(field, "must be a positive number"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_HISTORY_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(5000)), MAX_HISTORY_LIMIT);
    }

    #[test]
    fn test_profile_update_rejects_non_positive_weight() {
        let update = ProfileUpdate {
            weight_kg: Some(0.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_new_workout_defaults_performed_at() {
        let now = Utc::now();
        let workout = NewWorkout {
            user_id: "u1".into(),
            exercise: "Squat".into(),
            sets: 3,
            reps: 5,
            weight_kg: Some(100.0),
            ..Default::default()
        }
        .into_workout(now)
        .unwrap();

        assert_eq!(workout.performed_at, now);
        assert_eq!(workout.exercise, "Squat");
    }

    #[test]
    fn test_new_workout_requires_reps() {
        let result = NewWorkout {
            user_id: "u1".into(),
            exercise: "Plank".into(),
            sets: 1,
            reps: 0,
            ..Default::default()
        }
        .into_workout(Utc::now());
        assert!(result.is_err());
    }
}
