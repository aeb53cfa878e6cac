// FormRelay - Two-stage workout -> meal pipeline
//
// Stage one turns the workout form into a plan; stage two receives that plan's
// raw text as its only input. Stage two never runs if stage one fails.

use super::{MEAL, WORKOUT};
use crate::error::{error_response, RelayError};
use crate::upstream::Forwarder;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// The single field the meal workflow receives.
pub const MEAL_INPUT_FIELD: &str = "workout";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRequest {
    pub bodypart: String,
    pub difficulty: String,
    pub time: String,
}

impl WorkoutRequest {
    fn fields(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("bodypart".to_string(), self.bodypart.clone()),
            ("difficulty".to_string(), self.difficulty.clone()),
            ("time".to_string(), self.time.clone()),
        ])
    }
}

/// Stage-one artifact: the workout plan text exactly as the engine returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkoutPlan(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MealPlan(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub workout: WorkoutPlan,
    pub meal: MealPlan,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("workout step failed: {0}")]
    Workout(#[source] RelayError),
    #[error("meal step failed: {0}")]
    Meal(#[source] RelayError),
}

impl PipelineError {
    pub fn cause(&self) -> &RelayError {
        match self {
            PipelineError::Workout(e) | PipelineError::Meal(e) => e,
        }
    }

    /// Rejected input on the first stage is the client's fault; anything else is a 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Workout(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            PipelineError::Workout(e) => format!("Workout generation failed: {}", e.client_message()),
            PipelineError::Meal(e) => format!("Meal plan generation failed: {}", e.client_message()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.status_code().is_client_error() {
            4
        } else {
            5
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Workout pipeline failed");
        error_response(self.status_code(), self.client_message())
    }
}

pub struct WorkoutPipeline {
    forwarder: Arc<Forwarder>,
}

impl WorkoutPipeline {
    /// Returns `None` unless both the workout and meal workflows are configured.
    pub fn new(forwarder: Arc<Forwarder>) -> Option<Self> {
        let catalog = forwarder.catalog();
        if catalog.contains(WORKOUT) && catalog.contains(MEAL) {
            Some(Self { forwarder })
        } else {
            None
        }
    }

    pub async fn run(&self, request: &WorkoutRequest) -> Result<PipelineOutcome, PipelineError> {
        let workout = self.plan_workout(request).await?;
        let meal = self.plan_meal(&workout).await?;
        Ok(PipelineOutcome { workout, meal })
    }

    pub async fn plan_workout(&self, request: &WorkoutRequest) -> Result<WorkoutPlan, PipelineError> {
        tracing::info!(bodypart = %request.bodypart, "Pipeline stage 1: workout");
        let reply = self
            .forwarder
            .forward(WORKOUT, &request.fields())
            .await
            .map_err(PipelineError::Workout)?;
        Ok(WorkoutPlan(reply.result))
    }

    pub async fn plan_meal(&self, workout: &WorkoutPlan) -> Result<MealPlan, PipelineError> {
        tracing::info!(plan_len = workout.0.len(), "Pipeline stage 2: meal");
        let fields = BTreeMap::from([(MEAL_INPUT_FIELD.to_string(), workout.0.clone())]);
        let reply = self
            .forwarder
            .forward(MEAL, &fields)
            .await
            .map_err(PipelineError::Meal)?;
        Ok(MealPlan(reply.result))
    }
}
