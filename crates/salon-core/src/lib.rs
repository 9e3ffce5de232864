//! Salon engagement core: turns typed rows into the view models the admin
//! dashboard and the client portal render.
//!
//! - Booking status from a client's next appointment
//! - Update timeline filtering and month grouping
//! - Reaction tallies with "did the viewer react" flags
//! - Upcoming/past appointment split and countdown labels
//! - One-shot read tracking driven by visibility reports
//! - Optimistic preference toggling with revert on failure
//!
//! Nothing here performs I/O. Callers fetch rows through `salon-db` and
//! hand the results in.

pub mod appointments;
pub mod grouping;
pub mod preference;
pub mod reactions;
pub mod read_tracking;
pub mod status;

pub use appointments::{
    AppointmentPartition, Countdown, countdown, days_until, is_upcoming, next_appointment_date,
    partition,
};
pub use grouping::{
    Dated, FilterError, MonthGroup, UpdateFilter, available_years, filter_updates, group_by_month,
    unread_count,
};
pub use preference::OptimisticToggle;
pub use reactions::{ReactionSummary, summarize, summarize_by_target};
pub use read_tracking::{READ_DEBOUNCE, ReadState, ReadTracker, VISIBILITY_THRESHOLD};
pub use status::{ClientStatus, client_status};
