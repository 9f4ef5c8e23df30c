use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Datelike, Days, Local, Utc, Weekday};
use serde::Serialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Customer, Reservation, ReservationStatus, DEFAULT_END_TIME, DEFAULT_START_TIME};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SeedResponse {
    pub customer: Customer,
    pub reservation: Reservation,
}

// POST /api/dev/seed
//
// Inserts a throwaway customer plus a PENDING reservation on the next free
// Saturday, bypassing the engine. Guarded by DEV_KEY; disabled when unset.
pub async fn seed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SeedResponse>, AppError> {
    let key = headers.get("x-dev-key").and_then(|v| v.to_str().ok());
    if state.config.dev_key.is_empty() || key != Some(state.config.dev_key.as_str()) {
        return Err(AppError::Unauthorized);
    }

    let db = state.db.lock().unwrap();
    let now = Utc::now().naive_utc();

    let suffix = Uuid::new_v4().as_u128() % 10_000;
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: "Cliente Teste".to_string(),
        phone: format!("1199{suffix:04}000"),
        email: "cliente@teste.com".to_string(),
        created_at: now,
        updated_at: now,
    };
    queries::insert_customer(&db, &customer)?;

    // Next Saturday without an active reservation.
    let mut event_date = Local::now().date_naive();
    while event_date.weekday() != Weekday::Sat
        || queries::find_active_on_date(&db, event_date)?.is_some()
    {
        event_date = event_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::InvalidDate("date overflow".to_string()))?;
    }

    let reservation = Reservation {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        event_date,
        start_time: DEFAULT_START_TIME.to_string(),
        end_time: DEFAULT_END_TIME.to_string(),
        status: ReservationStatus::Pending,
        deposit_amount: 100.0,
        total_amount: 600.0,
        deposit_paid: false,
        deposit_paid_at: None,
        notes: String::new(),
        created_at: now,
        updated_at: now,
    };
    queries::insert_reservation(&db, &reservation).map_err(|e| match e {
        queries::InsertReservationError::ActiveDateTaken => AppError::DateConflict(event_date),
        queries::InsertReservationError::Db(e) => e.into(),
    })?;

    tracing::info!(id = %reservation.id, date = %event_date, "seeded reservation");
    Ok(Json(SeedResponse {
        customer,
        reservation,
    }))
}
