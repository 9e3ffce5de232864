use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a client has something booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    HasUpcoming,
    NoUpcoming,
}

/// Derive the booking status from `profiles.next_appointment_date`.
/// An appointment at exactly `now` still counts as upcoming.
pub fn client_status(next_appointment: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ClientStatus {
    match next_appointment {
        Some(at) if at >= now => ClientStatus::HasUpcoming,
        _ => ClientStatus::NoUpcoming,
    }
}
