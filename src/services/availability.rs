use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;

/// The venue only hosts events on Saturdays and Sundays.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Dates occupied by an active (PENDING or CONFIRMED) reservation.
/// Recomputed from the reservation set on every call; never cached.
pub fn occupied_dates(conn: &Connection) -> Result<Vec<NaiveDate>, AppError> {
    Ok(queries::occupied_dates(conn)?)
}

/// A date is free only if it is a future-or-today weekend date with no
/// active reservation. Weekdays and past dates read as unavailable even
/// with no conflicting reservation, so a calendar built on this never
/// offers them.
pub fn is_free(conn: &Connection, date: NaiveDate, today: NaiveDate) -> Result<bool, AppError> {
    if !is_weekend(date) || date < today {
        return Ok(false);
    }
    Ok(queries::find_active_on_date(conn, date)?.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::reservations::{self, CreateReservation};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2025-06-02 is a Monday; 2025-06-07 a Saturday.
    const TODAY: &str = "2025-06-02";

    fn create(conn: &Connection, day: &str) {
        let input = CreateReservation {
            customer_id: None,
            name: Some("Ana".to_string()),
            phone: Some("11987654321".to_string()),
            email: None,
            event_date: day.to_string(),
            start_time: None,
            end_time: None,
            deposit_amount: None,
            total_amount: None,
            notes: None,
        };
        reservations::create_reservation(conn, input, date(TODAY)).unwrap();
    }

    #[test]
    fn test_weekday_is_never_free() {
        let conn = setup_db();
        assert!(!is_free(&conn, date("2025-06-04"), date(TODAY)).unwrap());
    }

    #[test]
    fn test_past_weekend_is_not_free() {
        let conn = setup_db();
        assert!(!is_free(&conn, date("2025-05-31"), date(TODAY)).unwrap());
    }

    #[test]
    fn test_open_weekend_is_free_until_booked() {
        let conn = setup_db();
        let saturday = date("2025-06-07");
        assert!(is_free(&conn, saturday, date(TODAY)).unwrap());

        create(&conn, "2025-06-07");
        assert!(!is_free(&conn, saturday, date(TODAY)).unwrap());
        assert_eq!(occupied_dates(&conn).unwrap(), vec![saturday]);
    }

    #[test]
    fn test_occupied_dates_sorted_and_distinct() {
        let conn = setup_db();
        create(&conn, "2025-06-14");
        create(&conn, "2025-06-07");
        assert_eq!(
            occupied_dates(&conn).unwrap(),
            vec![date("2025-06-07"), date("2025-06-14")]
        );
    }
}
