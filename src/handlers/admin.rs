use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::bearer;
use crate::errors::AppError;
use crate::models::{MetricsSnapshot, Reservation, ReservationStatus, StatusAction};
use crate::services::reservations::{self, MoneyInput};
use crate::services::metrics;
use crate::state::AppState;

// GET /api/admin/reservations
#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<ReservationStatus>,
}

#[derive(Serialize)]
pub struct AdminReservation {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    /// Deep link for contacting the customer; presentation only.
    pub whatsapp_link: String,
}

pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AdminReservation>>, AppError> {
    let rows = {
        let db = state.db.lock().unwrap();
        reservations::list_reservations(
            &db,
            state.admin_gate.as_ref(),
            bearer(&headers),
            query.status,
        )?
    };

    let response = rows
        .into_iter()
        .map(|row| AdminReservation {
            whatsapp_link: format!("https://wa.me/{}", row.customer_phone),
            reservation: row.reservation,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_email: row.customer_email,
        })
        .collect();

    Ok(Json(response))
}

// PATCH /api/admin/reservations/:id
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationAction {
    Confirm,
    Cancel,
    MarkDepositPaid { amount: Option<MoneyInput> },
    UnmarkDepositPaid,
}

pub async fn update_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ReservationAction>,
) -> Result<Json<Reservation>, AppError> {
    let gate = state.admin_gate.as_ref();
    let credential = bearer(&headers);
    let now: NaiveDateTime = Local::now().naive_local();

    let reservation = {
        let db = state.db.lock().unwrap();
        match body {
            ReservationAction::Confirm => {
                reservations::transition_status(&db, gate, credential, &id, StatusAction::Confirm)?
            }
            ReservationAction::Cancel => {
                reservations::transition_status(&db, gate, credential, &id, StatusAction::Cancel)?
            }
            ReservationAction::MarkDepositPaid { amount } => {
                reservations::mark_deposit_paid(&db, gate, credential, &id, amount.as_ref(), now)?
            }
            ReservationAction::UnmarkDepositPaid => {
                reservations::unmark_deposit_paid(&db, gate, credential, &id)?
            }
        }
    };

    Ok(Json(reservation))
}

// GET /api/admin/metrics
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MetricsSnapshot>, AppError> {
    let as_of: NaiveDate = Local::now().date_naive();

    let snapshot = {
        let db = state.db.lock().unwrap();
        metrics::compute_metrics(&db, state.admin_gate.as_ref(), bearer(&headers), as_of)?
    };

    Ok(Json(snapshot))
}
