use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{MetricsSnapshot, MonthlyCount};
use crate::services::auth::{require_admin, AdminGate};

/// Dashboard page size for the upcoming-reservations table.
const UPCOMING_LIMIT: i64 = 10;
/// Length of the monthly time series.
const SERIES_MONTHS: u32 = 6;

/// One pass over the reservation set as of `as_of`. Pure read model:
/// nothing is persisted or cached, so the snapshot can never go stale.
pub fn compute_metrics(
    conn: &Connection,
    gate: &dyn AdminGate,
    credential: Option<&str>,
    as_of: NaiveDate,
) -> Result<MetricsSnapshot, AppError> {
    require_admin(gate, credential)?;

    let counts = queries::status_counts(conn)?;
    let total = counts.pending + counts.confirmed + counts.cancelled;
    let conversion_rate = if total > 0 {
        counts.confirmed as f64 / total as f64
    } else {
        0.0
    };

    let month_start = as_of.with_day(1).unwrap_or(as_of);
    let next_month_start = month_start
        .checked_add_months(Months::new(1))
        .unwrap_or(month_start);

    let (confirmed_revenue_total, confirmed_deposit_total) = queries::confirmed_sums(conn, None)?;
    let (confirmed_revenue_this_month, confirmed_deposit_this_month) =
        queries::confirmed_sums(conn, Some((month_start, next_month_start)))?;

    let pending = queries::pending_sums(conn)?;
    let deposit_paid_total = queries::deposit_paid_sum(conn)?;
    let upcoming = queries::upcoming_reservations(conn, as_of, UPCOMING_LIMIT)?;
    let monthly_series = monthly_series(conn, as_of)?;

    Ok(MetricsSnapshot {
        total,
        pending: counts.pending,
        confirmed: counts.confirmed,
        cancelled: counts.cancelled,
        conversion_rate,
        confirmed_revenue_total,
        confirmed_deposit_total,
        confirmed_revenue_this_month,
        confirmed_deposit_this_month,
        pending_revenue: pending.revenue,
        pending_deposit_total: pending.deposit_total,
        pending_deposit_unpaid: pending.deposit_unpaid,
        deposit_paid_total,
        upcoming,
        monthly_series,
    })
}

/// Reservation counts for the 6 calendar months ending at `as_of`'s month,
/// oldest first, zero-filled for months with no activity.
fn monthly_series(conn: &Connection, as_of: NaiveDate) -> Result<Vec<MonthlyCount>, AppError> {
    let by_month: HashMap<String, i64> = queries::counts_by_month(conn)?.into_iter().collect();

    let mut series = Vec::with_capacity(SERIES_MONTHS as usize);
    for i in (0..SERIES_MONTHS).rev() {
        let month = as_of
            .checked_sub_months(Months::new(i))
            .unwrap_or(as_of)
            .format("%Y-%m")
            .to_string();
        let total = by_month.get(&month).copied().unwrap_or(0);
        series.push(MonthlyCount { month, total });
    }
    Ok(series)
}
