//! Fitness tracker endpoints
//!
//! - `GET /api/profile?userId=` / `POST /api/profile`
//! - `GET /api/weight-log?userId=&limit=`
//! - `GET /api/workouts?userId=&limit=` / `POST /api/workouts`

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use studyforge_core::{NewWorkout, Profile, ProfileUpdate, WeightEntry, Workout};

use crate::{AppState, HttpError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub profile: Profile,
    pub weight_logged: bool,
}

#[derive(Debug, Serialize)]
pub struct WeightLogResponse {
    pub success: bool,
    pub entries: Vec<WeightEntry>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub success: bool,
    pub workout: Workout,
}

#[derive(Debug, Serialize)]
pub struct WorkoutListResponse {
    pub success: bool,
    pub workouts: Vec<Workout>,
}

async fn get_profile(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ProfileResponse>, HttpError> {
    let Query(query) = query?;
    let profile = state.fitness_service.get_profile(&query.user_id).await?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

async fn update_profile(
    State(state): State<AppState>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, HttpError> {
    let Json(request) = payload?;
    let outcome = state
        .fitness_service
        .update_profile(&request.user_id, request.update)
        .await?;

    Ok(Json(UpdateProfileResponse {
        success: true,
        profile: outcome.profile,
        weight_logged: outcome.weight_logged,
    }))
}

async fn weight_log(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<WeightLogResponse>, HttpError> {
    let Query(query) = query?;
    let entries = state
        .fitness_service
        .weight_history(&query.user_id, query.limit)
        .await?;

    Ok(Json(WeightLogResponse {
        success: true,
        entries,
    }))
}

async fn log_workout(
    State(state): State<AppState>,
    payload: Result<Json<NewWorkout>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkoutResponse>), HttpError> {
    let Json(workout) = payload?;
    let workout = state.fitness_service.log_workout(workout).await?;

    Ok((
        StatusCode::CREATED,
        Json(WorkoutResponse {
            success: true,
            workout,
        }),
    ))
}

async fn list_workouts(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<WorkoutListResponse>, HttpError> {
    let Query(query) = query?;
    let workouts = state
        .fitness_service
        .list_workouts(&query.user_id, query.limit)
        .await?;

    Ok(Json(WorkoutListResponse {
        success: true,
        workouts,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile).post(update_profile))
        .route("/api/weight-log", get(weight_log))
        .route("/api/workouts", get(list_workouts).post(log_workout))
        .with_state(state)
}
