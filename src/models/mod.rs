pub mod customer;
pub mod metrics;
pub mod reservation;

pub use customer::Customer;
pub use metrics::{MetricsSnapshot, MonthlyCount, UpcomingReservation};
pub use reservation::{
    Reservation, ReservationStatus, StatusAction, Transition, DEFAULT_END_TIME, DEFAULT_START_TIME,
};
