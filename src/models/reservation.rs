use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_START_TIME: &str = "09:30";
pub const DEFAULT_END_TIME: &str = "22:00";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub customer_id: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: ReservationStatus,
    pub deposit_amount: f64,
    pub total_amount: f64,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<NaiveDateTime>,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Operator actions on a reservation's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusAction {
    Confirm,
    Cancel,
}

/// Outcome of applying a status action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed(ReservationStatus),
    /// Repeating an action that already holds (operator double-click).
    Unchanged,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CONFIRMED" => ReservationStatus::Confirmed,
            "CANCELLED" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Pending,
        }
    }

    /// The whole transition table lives here; call sites never re-validate.
    /// `None` means the transition is not allowed. A CANCELLED reservation
    /// can never become CONFIRMED again: its date was freed, and a new
    /// reservation must be created instead.
    pub fn apply(self, action: StatusAction) -> Option<Transition> {
        use ReservationStatus::*;
        use StatusAction::*;
        match (self, action) {
            (Pending, Confirm) => Some(Transition::Changed(Confirmed)),
            (Pending, Cancel) => Some(Transition::Changed(Cancelled)),
            (Confirmed, Cancel) => Some(Transition::Changed(Cancelled)),
            (Confirmed, Confirm) => Some(Transition::Unchanged),
            (Cancelled, Cancel) => Some(Transition::Unchanged),
            (Cancelled, Confirm) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert_eq!(
            ReservationStatus::Pending.apply(StatusAction::Confirm),
            Some(Transition::Changed(ReservationStatus::Confirmed))
        );
        assert_eq!(
            ReservationStatus::Pending.apply(StatusAction::Cancel),
            Some(Transition::Changed(ReservationStatus::Cancelled))
        );
    }

    #[test]
    fn test_matching_terminal_actions_are_noops() {
        assert_eq!(
            ReservationStatus::Confirmed.apply(StatusAction::Confirm),
            Some(Transition::Unchanged)
        );
        assert_eq!(
            ReservationStatus::Cancelled.apply(StatusAction::Cancel),
            Some(Transition::Unchanged)
        );
    }

    #[test]
    fn test_cancelled_cannot_be_confirmed() {
        assert_eq!(ReservationStatus::Cancelled.apply(StatusAction::Confirm), None);
    }
}
