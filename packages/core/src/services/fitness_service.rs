//! Fitness tracker: profile, weight log and workouts.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::ActivityStore;
use crate::models::session::required;
use crate::models::{
    clamp_limit, NewWorkout, Profile, ProfileUpdate, ProfileUpdateOutcome, WeightEntry, Workout,
};
use crate::services::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct FitnessService {
    store: Arc<dyn ActivityStore>,
}

impl FitnessService {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user_id: &str) -> ServiceResult<Profile> {
        let user_id = required("userId", user_id)?;

        self.store
            .get_profile(&user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", user_id))
    }

    /// Upsert the profile, then log the weight if one was supplied.
    ///
    /// The weight log is best effort: a failed insert is logged and reported
    /// through `weight_logged = false`, and the profile write stays committed.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> ServiceResult<ProfileUpdateOutcome> {
        let user_id = required("userId", user_id)?;
        update.validate()?;

        let now = Utc::now();
        let profile = self.store.upsert_profile(&user_id, &update, now).await?;
        info!(user_id = %user_id, "updated profile");

        let weight_logged = match update.weight_kg {
            Some(weight_kg) => {
                match self
                    .store
                    .insert_weight_entry(WeightEntry::new(&user_id, weight_kg, now))
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            user_id = %user_id,
                            error = %e,
                            "failed to log weight alongside profile update"
                        );
                        false
                    }
                }
            }
            None => false,
        };

        Ok(ProfileUpdateOutcome {
            profile,
            weight_logged,
        })
    }

    pub async fn weight_history(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<WeightEntry>> {
        let user_id = required("userId", user_id)?;
        Ok(self.store.weight_entries(&user_id, clamp_limit(limit)).await?)
    }

    pub async fn log_workout(&self, workout: NewWorkout) -> ServiceResult<Workout> {
        let workout = workout.into_workout(Utc::now())?;
        let saved = self.store.insert_workout(workout).await?;

        info!(
            id = %saved.id,
            user_id = %saved.user_id,
            exercise = %saved.exercise,
            "logged workout"
        );
        Ok(saved)
    }

    pub async fn list_workouts(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<Workout>> {
        let user_id = required("userId", user_id)?;
        Ok(self.store.workouts(&user_id, clamp_limit(limit)).await?)
    }
}
