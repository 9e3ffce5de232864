use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Serialize, Serializer};

use salon_types::Appointment;

/// Still ahead of us and not yet marked done.
pub fn is_upcoming(appointment: &Appointment, now: DateTime<Utc>) -> bool {
    appointment.date >= now && !appointment.completed
}

/// A client's appointments split around `now`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentPartition {
    /// Soonest first.
    pub upcoming: Vec<Appointment>,
    /// Most recent first.
    pub past: Vec<Appointment>,
}

impl AppointmentPartition {
    pub fn next(&self) -> Option<&Appointment> {
        self.upcoming.first()
    }

    pub fn other_upcoming(&self) -> &[Appointment] {
        self.upcoming.get(1..).unwrap_or(&[])
    }
}

pub fn partition(appointments: Vec<Appointment>, now: DateTime<Utc>) -> AppointmentPartition {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
        appointments.into_iter().partition(|a| is_upcoming(a, now));

    upcoming.sort_by(|a, b| a.date.cmp(&b.date));
    past.sort_by(|a, b| b.date.cmp(&a.date));

    AppointmentPartition { upcoming, past }
}

/// Earliest upcoming appointment date, the value kept in
/// `profiles.next_appointment_date`.
pub fn next_appointment_date(appointments: &[Appointment], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    appointments
        .iter()
        .filter(|a| is_upcoming(a, now))
        .map(|a| a.date)
        .min()
}

/// Whole calendar days between `now` and `target`, both truncated to
/// midnight in `tz`.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>, tz: &FixedOffset) -> i64 {
    let target_day = target.with_timezone(tz).date_naive();
    let today = now.with_timezone(tz).date_naive();
    (target_day - today).num_days()
}

/// Relative-time label for the next appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Today,
    Tomorrow,
    Days(i64),
    OneWeek,
    Weeks(i64),
    Months(i64),
}

impl Countdown {
    /// Weeks and months round down: 20 days is `Weeks(2)`, 45 days is
    /// `Months(1)`. Negative deltas clamp to `Today`.
    pub fn from_days(days: i64) -> Self {
        match days {
            i64::MIN..=0 => Self::Today,
            1 => Self::Tomorrow,
            2..=6 => Self::Days(days),
            7..=13 => Self::OneWeek,
            14..=29 => Self::Weeks(days / 7),
            _ => Self::Months(days / 30),
        }
    }

    pub fn label_en(&self) -> String {
        match *self {
            Self::Today => "today".to_string(),
            Self::Tomorrow => "tomorrow".to_string(),
            Self::Days(n) => format!("{n} days"),
            Self::OneWeek => "1 week".to_string(),
            Self::Weeks(n) => format!("{n} weeks"),
            Self::Months(1) => "1 month".to_string(),
            Self::Months(n) => format!("{n} months"),
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Today => f.write_str("Hoje"),
            Self::Tomorrow => f.write_str("Amanhã"),
            Self::Days(n) => write!(f, "Faltam {n} dias"),
            Self::OneWeek => f.write_str("Falta 1 semana"),
            Self::Weeks(n) => write!(f, "Faltam {n} semanas"),
            Self::Months(1) => f.write_str("Falta 1 mês"),
            Self::Months(n) => write!(f, "Faltam {n} meses"),
        }
    }
}

impl Serialize for Countdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn countdown(target: DateTime<Utc>, now: DateTime<Utc>, tz: &FixedOffset) -> Countdown {
    Countdown::from_days(days_until(target, now, tz))
}
