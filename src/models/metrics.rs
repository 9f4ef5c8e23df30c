use chrono::NaiveDate;
use serde::Serialize;

use super::ReservationStatus;

/// Freshly computed aggregate over the full reservation set. Never cached;
/// every call re-derives it from storage.
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    /// confirmed / total, 0 when there are no reservations.
    pub conversion_rate: f64,

    pub confirmed_revenue_total: f64,
    pub confirmed_deposit_total: f64,
    pub confirmed_revenue_this_month: f64,
    pub confirmed_deposit_this_month: f64,

    pub pending_revenue: f64,
    pub pending_deposit_total: f64,
    pub pending_deposit_unpaid: f64,

    /// Deposits marked paid, regardless of status.
    pub deposit_paid_total: f64,

    pub upcoming: Vec<UpcomingReservation>,
    pub monthly_series: Vec<MonthlyCount>,
}

/// An active reservation with event date today or later, joined with its
/// customer for the dashboard table.
#[derive(Debug, Serialize)]
pub struct UpcomingReservation {
    pub id: String,
    pub event_date: NaiveDate,
    pub status: ReservationStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub deposit_amount: f64,
    pub total_amount: f64,
    pub deposit_paid: bool,
}

#[derive(Debug, Serialize)]
pub struct MonthlyCount {
    /// "YYYY-MM"
    pub month: String,
    pub total: i64,
}
