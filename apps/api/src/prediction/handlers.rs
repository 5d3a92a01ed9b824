use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::PredictionResult;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/applications/:id/prediction
pub async fn handle_get_prediction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PredictionResult>, AppError> {
    let prediction = state.prediction.predict_application(id).await?;
    Ok(Json(prediction))
}
