use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries::{self, InsertReservationError, ReservationWithCustomer};
use crate::errors::AppError;
use crate::models::{
    Reservation, ReservationStatus, StatusAction, Transition, DEFAULT_END_TIME, DEFAULT_START_TIME,
};
use crate::services::auth::{require_admin, AdminGate};
use crate::services::availability;
use crate::services::directory;

/// Booking request from the public form. Either `customer_id` or
/// name+phone must be supplied; monetary fields accept a JSON number or a
/// string with `.` or `,` as decimal separator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub customer_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub event_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub deposit_amount: Option<MoneyInput>,
    pub total_amount: Option<MoneyInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(f64),
    Text(String),
}

/// Missing amounts default to 0. Anything that does not resolve to a
/// non-negative finite number is rejected.
pub fn parse_amount(input: Option<&MoneyInput>) -> Result<f64, AppError> {
    let value = match input {
        None => 0.0,
        Some(MoneyInput::Number(n)) => *n,
        Some(MoneyInput::Text(s)) => {
            let normalized = s.trim().replace(',', ".");
            normalized
                .parse::<f64>()
                .map_err(|_| AppError::InvalidAmount(s.clone()))?
        }
    };

    if !value.is_finite() || value < 0.0 {
        return Err(AppError::InvalidAmount(value.to_string()));
    }
    Ok(value)
}

/// Strict YYYY-MM-DD, real calendar date.
fn parse_event_date(raw: &str) -> Result<NaiveDate, AppError> {
    if raw.len() != 10 {
        return Err(AppError::InvalidDate(format!(
            "{raw}: expected YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(format!("{raw}: expected YYYY-MM-DD")))
}

/// Creates a reservation in PENDING for a free weekend date.
///
/// The pre-insert conflict lookup only exists to produce a friendly error
/// without hitting the index; the partial unique index on active event
/// dates is what actually serializes two racing requests, and its
/// violation surfaces as the same `DateConflict`.
pub fn create_reservation(
    conn: &Connection,
    input: CreateReservation,
    today: NaiveDate,
) -> Result<Reservation, AppError> {
    let event_date = parse_event_date(&input.event_date)?;
    if !availability::is_weekend(event_date) {
        return Err(AppError::InvalidDate(format!(
            "{event_date} is not a Saturday or Sunday"
        )));
    }
    if event_date < today {
        return Err(AppError::InvalidDate(format!("{event_date} is in the past")));
    }

    let deposit_amount = parse_amount(input.deposit_amount.as_ref())?;
    let total_amount = parse_amount(input.total_amount.as_ref())?;

    if queries::find_active_on_date(conn, event_date)?.is_some() {
        return Err(AppError::DateConflict(event_date));
    }

    let customer = match &input.customer_id {
        Some(id) => queries::get_customer(conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?,
        None => {
            let phone = input
                .phone
                .as_deref()
                .ok_or_else(|| AppError::InvalidPhone("phone is required".to_string()))?;
            directory::resolve_customer(
                conn,
                input.name.as_deref().unwrap_or(""),
                phone,
                input.email.as_deref().unwrap_or(""),
            )?
        }
    };

    let now = Utc::now().naive_utc();
    let reservation = Reservation {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id,
        event_date,
        start_time: input
            .start_time
            .unwrap_or_else(|| DEFAULT_START_TIME.to_string()),
        end_time: input.end_time.unwrap_or_else(|| DEFAULT_END_TIME.to_string()),
        status: ReservationStatus::Pending,
        deposit_amount,
        total_amount,
        deposit_paid: false,
        deposit_paid_at: None,
        notes: input.notes.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    match queries::insert_reservation(conn, &reservation) {
        Ok(()) => {
            tracing::info!(id = %reservation.id, date = %event_date, "reservation created");
            Ok(reservation)
        }
        // Lost a race for the date between the pre-check and the insert.
        Err(InsertReservationError::ActiveDateTaken) => Err(AppError::DateConflict(event_date)),
        Err(InsertReservationError::Db(e)) => Err(e.into()),
    }
}

/// Applies CONFIRM or CANCEL through the central transition table.
/// Repeating an action that already holds returns the record unchanged.
pub fn transition_status(
    conn: &Connection,
    gate: &dyn AdminGate,
    credential: Option<&str>,
    id: &str,
    action: StatusAction,
) -> Result<Reservation, AppError> {
    require_admin(gate, credential)?;

    let reservation = queries::get_reservation(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?;

    match reservation.status.apply(action) {
        None => Err(AppError::InvalidTransition(format!(
            "{:?} not allowed from {}",
            action,
            reservation.status.as_str()
        ))),
        Some(Transition::Unchanged) => Ok(reservation),
        Some(Transition::Changed(next)) => {
            queries::update_reservation_status(conn, id, next)?;
            tracing::info!(id, from = reservation.status.as_str(), to = next.as_str(), "status changed");
            queries::get_reservation(conn, id)?
                .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))
        }
    }
}

/// Marks the deposit as paid now. A supplied amount replaces the quoted
/// deposit; `None` keeps it.
pub fn mark_deposit_paid(
    conn: &Connection,
    gate: &dyn AdminGate,
    credential: Option<&str>,
    id: &str,
    amount: Option<&MoneyInput>,
    now: NaiveDateTime,
) -> Result<Reservation, AppError> {
    require_admin(gate, credential)?;

    let reservation = queries::get_reservation(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?;

    let amount = match amount {
        Some(input) => parse_amount(Some(input))?,
        None => reservation.deposit_amount,
    };

    queries::set_deposit_paid(conn, id, amount, now)?;
    queries::get_reservation(conn, id)?.ok_or_else(|| AppError::NotFound(format!("reservation {id}")))
}

/// Clears the paid flag and timestamp; deposit_amount keeps the last
/// quoted value.
pub fn unmark_deposit_paid(
    conn: &Connection,
    gate: &dyn AdminGate,
    credential: Option<&str>,
    id: &str,
) -> Result<Reservation, AppError> {
    require_admin(gate, credential)?;

    if !queries::clear_deposit_paid(conn, id)? {
        return Err(AppError::NotFound(format!("reservation {id}")));
    }
    queries::get_reservation(conn, id)?.ok_or_else(|| AppError::NotFound(format!("reservation {id}")))
}

/// Full listing for the admin view, newest created first.
pub fn list_reservations(
    conn: &Connection,
    gate: &dyn AdminGate,
    credential: Option<&str>,
    status_filter: Option<ReservationStatus>,
) -> Result<Vec<ReservationWithCustomer>, AppError> {
    require_admin(gate, credential)?;
    Ok(queries::list_reservations(conn, status_filter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::auth::TokenGate;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn gate() -> TokenGate {
        TokenGate::new("test-token".to_string())
    }

    const ADMIN: Option<&str> = Some("test-token");
    // Monday; the following Saturday is 2025-06-07.
    const TODAY: &str = "2025-06-02";

    fn request(day: &str) -> CreateReservation {
        CreateReservation {
            customer_id: None,
            name: Some("Ana".to_string()),
            phone: Some("11987654321".to_string()),
            email: None,
            event_date: day.to_string(),
            start_time: None,
            end_time: None,
            deposit_amount: Some(MoneyInput::Number(100.0)),
            total_amount: Some(MoneyInput::Number(600.0)),
            notes: None,
        }
    }

    fn create(conn: &Connection, day: &str) -> Reservation {
        create_reservation(conn, request(day), date(TODAY)).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.start_time, "09:30");
        assert_eq!(r.end_time, "22:00");
        assert!(!r.deposit_paid);
        assert!(r.deposit_paid_at.is_none());
    }

    #[test]
    fn test_weekdays_always_rejected() {
        let conn = setup_db();
        // Mon..Fri of the same week
        for day in ["2025-06-02", "2025-06-03", "2025-06-04", "2025-06-05", "2025-06-06"] {
            let result = create_reservation(&conn, request(day), date(TODAY));
            assert!(matches!(result, Err(AppError::InvalidDate(_))), "{day}");
        }
    }

    #[test]
    fn test_past_date_rejected() {
        let conn = setup_db();
        // A Saturday, but before today.
        let result = create_reservation(&conn, request("2025-05-31"), date(TODAY));
        assert!(matches!(result, Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let conn = setup_db();
        for raw in ["07/06/2025", "2025-6-7", "2025-13-01", "soon"] {
            let result = create_reservation(&conn, request(raw), date(TODAY));
            assert!(matches!(result, Err(AppError::InvalidDate(_))), "{raw}");
        }
    }

    #[test]
    fn test_double_booking_conflicts() {
        let conn = setup_db();
        create(&conn, "2025-06-07");
        let result = create_reservation(&conn, request("2025-06-07"), date(TODAY));
        assert!(matches!(result, Err(AppError::DateConflict(_))));
    }

    #[test]
    fn test_index_violation_reported_as_conflict() {
        // Bypass the optimistic pre-check and hit the partial unique index
        // directly, as a racing second request would.
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        let mut clone = r.clone();
        clone.id = Uuid::new_v4().to_string();
        let result = queries::insert_reservation(&conn, &clone);
        assert!(matches!(result, Err(InsertReservationError::ActiveDateTaken)));
    }

    #[test]
    fn test_cancel_frees_the_date() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Cancel).unwrap();

        // Same date is bookable again; the cancelled row stays behind.
        let again = create_reservation(&conn, request("2025-06-07"), date(TODAY)).unwrap();
        assert_ne!(again.id, r.id);
    }

    #[test]
    fn test_confirm_then_cancel() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        let confirmed =
            transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Confirm).unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let cancelled =
            transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Cancel).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_repeated_actions_are_noops() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Confirm).unwrap();
        let again =
            transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Confirm).unwrap();
        assert_eq!(again.status, ReservationStatus::Confirmed);

        transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Cancel).unwrap();
        let still_cancelled =
            transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Cancel).unwrap();
        assert_eq!(still_cancelled.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_cancelled_cannot_be_resurrected() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Cancel).unwrap();
        let result = transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Confirm);
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_transition_requires_admin() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");

        let result = transition_status(&conn, &gate(), Some("wrong"), &r.id, StatusAction::Confirm);
        assert!(matches!(result, Err(AppError::Unauthorized)));
        let result = transition_status(&conn, &gate(), None, &r.id, StatusAction::Cancel);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_transition_unknown_id() {
        let conn = setup_db();
        let result = transition_status(&conn, &gate(), ADMIN, "nope", StatusAction::Confirm);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_deposit_mark_and_unmark() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");
        let now = Utc::now().naive_utc();

        let paid = mark_deposit_paid(
            &conn,
            &gate(),
            ADMIN,
            &r.id,
            Some(&MoneyInput::Text("150,50".to_string())),
            now,
        )
        .unwrap();
        assert!(paid.deposit_paid);
        assert!(paid.deposit_paid_at.is_some());
        assert_eq!(paid.deposit_amount, 150.5);

        let unpaid = unmark_deposit_paid(&conn, &gate(), ADMIN, &r.id).unwrap();
        assert!(!unpaid.deposit_paid);
        assert!(unpaid.deposit_paid_at.is_none());
        // The last quoted deposit stays on record.
        assert_eq!(unpaid.deposit_amount, 150.5);
    }

    #[test]
    fn test_deposit_mark_keeps_amount_when_not_supplied() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");
        let paid =
            mark_deposit_paid(&conn, &gate(), ADMIN, &r.id, None, Utc::now().naive_utc()).unwrap();
        assert_eq!(paid.deposit_amount, 100.0);
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount(None).unwrap(), 0.0);
        assert_eq!(parse_amount(Some(&MoneyInput::Number(600.0))).unwrap(), 600.0);
        assert_eq!(
            parse_amount(Some(&MoneyInput::Text("1200,75".to_string()))).unwrap(),
            1200.75
        );
        assert!(parse_amount(Some(&MoneyInput::Number(-1.0))).is_err());
        assert!(parse_amount(Some(&MoneyInput::Number(f64::NAN))).is_err());
        assert!(parse_amount(Some(&MoneyInput::Text("abc".to_string()))).is_err());
    }

    #[test]
    fn test_create_rejects_negative_amount() {
        let conn = setup_db();
        let mut input = request("2025-06-07");
        input.total_amount = Some(MoneyInput::Number(-600.0));
        let result = create_reservation(&conn, input, date(TODAY));
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn test_create_with_existing_customer_ref() {
        let conn = setup_db();
        let first = create(&conn, "2025-06-07");

        let input = CreateReservation {
            customer_id: Some(first.customer_id.clone()),
            name: None,
            phone: None,
            email: None,
            event_date: "2025-06-08".to_string(),
            start_time: None,
            end_time: None,
            deposit_amount: None,
            total_amount: None,
            notes: None,
        };
        let second = create_reservation(&conn, input, date(TODAY)).unwrap();
        assert_eq!(second.customer_id, first.customer_id);
    }

    #[test]
    fn test_create_unknown_customer_ref() {
        let conn = setup_db();
        let mut input = request("2025-06-07");
        input.customer_id = Some("missing".to_string());
        let result = create_reservation(&conn, input, date(TODAY));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_list_requires_admin() {
        let conn = setup_db();
        let result = list_reservations(&conn, &gate(), None, None);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_list_with_filter() {
        let conn = setup_db();
        let r = create(&conn, "2025-06-07");
        create(&conn, "2025-06-08");
        transition_status(&conn, &gate(), ADMIN, &r.id, StatusAction::Confirm).unwrap();

        let all = list_reservations(&conn, &gate(), ADMIN, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].customer_name, "Ana");

        let confirmed =
            list_reservations(&conn, &gate(), ADMIN, Some(ReservationStatus::Confirmed)).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].reservation.id, r.id);
    }
}
