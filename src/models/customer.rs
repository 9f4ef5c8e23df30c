use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A booking party, keyed by normalized phone number (digits only).
/// Created on first booking; later bookings by the same phone merge
/// name/email, never delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
