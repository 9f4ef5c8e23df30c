use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::services::availability;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OccupiedDatesResponse {
    pub dates: Vec<NaiveDate>,
}

// GET /api/calendar/occupied
pub async fn occupied_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OccupiedDatesResponse>, AppError> {
    let dates = {
        let db = state.db.lock().unwrap();
        availability::occupied_dates(&db)?
    };
    Ok(Json(OccupiedDatesResponse { dates }))
}
