use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Customer, Reservation, ReservationStatus, UpcomingReservation,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Statuses that occupy a date. Keep in sync with the partial unique index
/// in migrations/001_init.sql.
const ACTIVE_STATUSES: &str = "('PENDING', 'CONFIRMED')";

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_date_lossy(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime_lossy(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Customers ──

pub fn get_customer(conn: &Connection, id: &str) -> rusqlite::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, name, phone, email, created_at, updated_at FROM customers WHERE id = ?1",
        params![id],
        parse_customer_row,
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn get_customer_by_phone(conn: &Connection, phone: &str) -> rusqlite::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, name, phone, email, created_at, updated_at FROM customers WHERE phone = ?1",
        params![phone],
        parse_customer_row,
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn insert_customer(conn: &Connection, customer: &Customer) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, name, phone, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            customer.id,
            customer.name,
            customer.phone,
            customer.email,
            fmt_datetime(customer.created_at),
            fmt_datetime(customer.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_customer_contact(
    conn: &Connection,
    id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE customers SET
           name = COALESCE(?1, name),
           email = COALESCE(?2, email),
           updated_at = datetime('now')
         WHERE id = ?3",
        params![name, email, id],
    )?;
    Ok(())
}

fn parse_customer_row(row: &rusqlite::Row) -> rusqlite::Result<Customer> {
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        created_at: parse_datetime_lossy(&created_at_str),
        updated_at: parse_datetime_lossy(&updated_at_str),
    })
}

// ── Reservations ──

/// Insert failure, split so a violation of the active-date unique index can
/// be reported as a conflict rather than an opaque storage error.
#[derive(Debug)]
pub enum InsertReservationError {
    /// The partial unique index rejected a second active reservation for
    /// the same date. This is the authoritative conflict detection; the
    /// caller's pre-check only exists for a friendlier fast path.
    ActiveDateTaken,
    Db(rusqlite::Error),
}

pub fn insert_reservation(
    conn: &Connection,
    r: &Reservation,
) -> Result<(), InsertReservationError> {
    let result = conn.execute(
        "INSERT INTO reservations (id, customer_id, event_date, start_time, end_time, status,
             deposit_amount, total_amount, deposit_paid, deposit_paid_at, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            r.id,
            r.customer_id,
            fmt_date(r.event_date),
            r.start_time,
            r.end_time,
            r.status.as_str(),
            r.deposit_amount,
            r.total_amount,
            r.deposit_paid as i32,
            r.deposit_paid_at.map(fmt_datetime),
            r.notes,
            fmt_datetime(r.created_at),
            fmt_datetime(r.updated_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg
                    .as_deref()
                    .map(|m| m.contains("reservations.event_date"))
                    .unwrap_or(false) =>
        {
            Err(InsertReservationError::ActiveDateTaken)
        }
        Err(e) => Err(InsertReservationError::Db(e)),
    }
}

pub fn get_reservation(conn: &Connection, id: &str) -> rusqlite::Result<Option<Reservation>> {
    let result = conn.query_row(
        &format!("SELECT {RESERVATION_COLS} FROM reservations WHERE id = ?1"),
        params![id],
        parse_reservation_row,
    );

    match result {
        Ok(r) => Ok(Some(r)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The id of the active reservation on `date`, if any.
pub fn find_active_on_date(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Option<String>> {
    let result = conn.query_row(
        &format!(
            "SELECT id FROM reservations WHERE event_date = ?1 AND status IN {ACTIVE_STATUSES}"
        ),
        params![fmt_date(date)],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Distinct dates occupied by active reservations, ascending.
pub fn occupied_dates(conn: &Connection) -> rusqlite::Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT event_date FROM reservations
         WHERE status IN {ACTIVE_STATUSES} ORDER BY event_date ASC"
    ))?;

    let rows = stmt.query_map([], |row| {
        let s: String = row.get(0)?;
        Ok(parse_date_lossy(&s))
    })?;

    let mut dates = vec![];
    for row in rows {
        dates.push(row?);
    }
    Ok(dates)
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE reservations SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn set_deposit_paid(
    conn: &Connection,
    id: &str,
    amount: f64,
    paid_at: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE reservations SET deposit_amount = ?1, deposit_paid = 1, deposit_paid_at = ?2,
             updated_at = datetime('now')
         WHERE id = ?3",
        params![amount, fmt_datetime(paid_at), id],
    )?;
    Ok(count > 0)
}

/// Clears the paid flag and timestamp; deposit_amount keeps the last quoted
/// value as a historical record.
pub fn clear_deposit_paid(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE reservations SET deposit_paid = 0, deposit_paid_at = NULL,
             updated_at = datetime('now')
         WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

/// A reservation joined with its customer, for the admin list view.
pub struct ReservationWithCustomer {
    pub reservation: Reservation,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
}

pub fn list_reservations(
    conn: &Connection,
    status_filter: Option<ReservationStatus>,
) -> rusqlite::Result<Vec<ReservationWithCustomer>> {
    let base = format!(
        "SELECT {RESERVATION_COLS_R}, c.name, c.phone, c.email
         FROM reservations r
         JOIN customers c ON c.id = r.customer_id"
    );
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!("{base} WHERE r.status = ?1 ORDER BY r.created_at DESC"),
            vec![Box::new(status.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (format!("{base} ORDER BY r.created_at DESC"), vec![]),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(ReservationWithCustomer {
            reservation: parse_reservation_row(row)?,
            customer_name: row.get(13)?,
            customer_phone: row.get(14)?,
            customer_email: row.get(15)?,
        })
    })?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row?);
    }
    Ok(reservations)
}

const RESERVATION_COLS: &str = "id, customer_id, event_date, start_time, end_time, status, \
     deposit_amount, total_amount, deposit_paid, deposit_paid_at, notes, created_at, updated_at";

const RESERVATION_COLS_R: &str = "r.id, r.customer_id, r.event_date, r.start_time, r.end_time, \
     r.status, r.deposit_amount, r.total_amount, r.deposit_paid, r.deposit_paid_at, r.notes, \
     r.created_at, r.updated_at";

fn parse_reservation_row(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
    let event_date_str: String = row.get(2)?;
    let status_str: String = row.get(5)?;
    let deposit_paid_at_str: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Reservation {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        event_date: parse_date_lossy(&event_date_str),
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        status: ReservationStatus::parse(&status_str),
        deposit_amount: row.get(6)?,
        total_amount: row.get(7)?,
        deposit_paid: row.get::<_, i32>(8)? != 0,
        deposit_paid_at: deposit_paid_at_str.map(|s| parse_datetime_lossy(&s)),
        notes: row.get(10)?,
        created_at: parse_datetime_lossy(&created_at_str),
        updated_at: parse_datetime_lossy(&updated_at_str),
    })
}

// ── Metrics aggregates ──

pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

pub fn status_counts(conn: &Connection) -> rusqlite::Result<StatusCounts> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM reservations GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = StatusCounts {
        pending: 0,
        confirmed: 0,
        cancelled: 0,
    };
    for row in rows {
        let (status, count) = row?;
        match ReservationStatus::parse(&status) {
            ReservationStatus::Pending => counts.pending = count,
            ReservationStatus::Confirmed => counts.confirmed = count,
            ReservationStatus::Cancelled => counts.cancelled = count,
        }
    }
    Ok(counts)
}

/// Sums of total_amount and deposit_amount over CONFIRMED reservations,
/// optionally restricted to event dates in `[start, end)`.
pub fn confirmed_sums(
    conn: &Connection,
    range: Option<(NaiveDate, NaiveDate)>,
) -> rusqlite::Result<(f64, f64)> {
    match range {
        Some((start, end)) => conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0), COALESCE(SUM(deposit_amount), 0)
             FROM reservations
             WHERE status = 'CONFIRMED' AND event_date >= ?1 AND event_date < ?2",
            params![fmt_date(start), fmt_date(end)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ),
        None => conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0), COALESCE(SUM(deposit_amount), 0)
             FROM reservations WHERE status = 'CONFIRMED'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ),
    }
}

pub struct PendingSums {
    pub revenue: f64,
    pub deposit_total: f64,
    pub deposit_unpaid: f64,
}

pub fn pending_sums(conn: &Connection) -> rusqlite::Result<PendingSums> {
    conn.query_row(
        "SELECT COALESCE(SUM(total_amount), 0),
                COALESCE(SUM(deposit_amount), 0),
                COALESCE(SUM(CASE WHEN deposit_paid = 0 THEN deposit_amount ELSE 0 END), 0)
         FROM reservations WHERE status = 'PENDING'",
        [],
        |row| {
            Ok(PendingSums {
                revenue: row.get(0)?,
                deposit_total: row.get(1)?,
                deposit_unpaid: row.get(2)?,
            })
        },
    )
}

/// Deposits marked paid regardless of status.
pub fn deposit_paid_sum(conn: &Connection) -> rusqlite::Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(deposit_amount), 0) FROM reservations WHERE deposit_paid = 1",
        [],
        |row| row.get(0),
    )
}

pub fn upcoming_reservations(
    conn: &Connection,
    today: NaiveDate,
    limit: i64,
) -> rusqlite::Result<Vec<UpcomingReservation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT r.id, r.event_date, r.status, c.name, c.phone,
                r.deposit_amount, r.total_amount, r.deposit_paid
         FROM reservations r
         JOIN customers c ON c.id = r.customer_id
         WHERE r.status IN {ACTIVE_STATUSES} AND r.event_date >= ?1
         ORDER BY r.event_date ASC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![fmt_date(today), limit], |row| {
        let event_date_str: String = row.get(1)?;
        let status_str: String = row.get(2)?;
        Ok(UpcomingReservation {
            id: row.get(0)?,
            event_date: parse_date_lossy(&event_date_str),
            status: ReservationStatus::parse(&status_str),
            customer_name: row.get(3)?,
            customer_phone: row.get(4)?,
            deposit_amount: row.get(5)?,
            total_amount: row.get(6)?,
            deposit_paid: row.get::<_, i32>(7)? != 0,
        })
    })?;

    let mut upcoming = vec![];
    for row in rows {
        upcoming.push(row?);
    }
    Ok(upcoming)
}

/// Reservation counts grouped by "YYYY-MM" of the event date.
pub fn counts_by_month(conn: &Connection) -> rusqlite::Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT substr(event_date, 1, 7) AS ym, COUNT(*)
         FROM reservations GROUP BY ym ORDER BY ym ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut counts = vec![];
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}
