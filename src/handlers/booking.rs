use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;

use crate::errors::AppError;
use crate::models::Reservation;
use crate::services::reservations::{self, CreateReservation};
use crate::state::AppState;

// POST /api/reservations
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReservation>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let today = Local::now().date_naive();

    let reservation = {
        let db = state.db.lock().unwrap();
        reservations::create_reservation(&db, body, today)?
    };

    Ok((StatusCode::CREATED, Json(reservation)))
}
