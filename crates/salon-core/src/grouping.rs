use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, FixedOffset, Locale, Utc};
use serde::Serialize;
use thiserror::Error;

use salon_types::{ClientUpdate, UpdateCategory};

/// Anything placed on the update timeline.
pub trait Dated {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Dated for ClientUpdate {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl<T: Dated + ?Sized> Dated for &T {
    fn created_at(&self) -> DateTime<Utc> {
        (**self).created_at()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid category filter '{0}'")]
    Category(String),
    #[error("invalid year filter '{0}'")]
    Year(String),
}

/// Timeline filter. `None` on either axis matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFilter {
    pub category: Option<UpdateCategory>,
    pub year: Option<i32>,
}

impl UpdateFilter {
    /// Parse the raw query values. Absent, empty and `"all"` all mean no filter.
    pub fn parse(category: Option<&str>, year: Option<&str>) -> Result<Self, FilterError> {
        let category = match category.map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                raw.parse::<UpdateCategory>()
                    .map_err(|_| FilterError::Category(raw.to_string()))?,
            ),
        };
        let year = match year.map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| FilterError::Year(raw.to_string()))?,
            ),
        };
        Ok(Self { category, year })
    }

    pub fn matches(&self, update: &ClientUpdate, tz: &FixedOffset) -> bool {
        if let Some(category) = self.category {
            if update.category != category {
                return false;
            }
        }
        if let Some(year) = self.year {
            if update.created_at.with_timezone(tz).year() != year {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.year.is_none()
    }
}

/// Keep the updates matching `filter`, in input order.
pub fn filter_updates<'a>(
    updates: &'a [ClientUpdate],
    filter: &UpdateFilter,
    tz: &FixedOffset,
) -> Vec<&'a ClientUpdate> {
    updates.iter().filter(|u| filter.matches(u, tz)).collect()
}

/// One calendar month of the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct MonthGroup<T> {
    pub year: i32,
    pub month: u32,
    /// pt-BR label, e.g. "outubro de 2026".
    pub label: String,
    pub updates: Vec<T>,
}

/// Partition `items` into calendar months (in `tz`).
///
/// Groups are ordered by their first member's timestamp, newest first.
/// Members keep their input order, so callers pass items sorted newest first.
pub fn group_by_month<T: Dated>(items: impl IntoIterator<Item = T>, tz: &FixedOffset) -> Vec<MonthGroup<T>> {
    let mut groups: Vec<MonthGroup<T>> = Vec::new();
    let mut index: HashMap<(i32, u32), usize> = HashMap::new();

    for item in items {
        let local = item.created_at().with_timezone(tz);
        let key = (local.year(), local.month());
        match index.get(&key) {
            Some(&i) => groups[i].updates.push(item),
            None => {
                index.insert(key, groups.len());
                groups.push(MonthGroup {
                    year: key.0,
                    month: key.1,
                    label: local.format_localized("%B de %Y", Locale::pt_BR).to_string(),
                    updates: vec![item],
                });
            }
        }
    }

    // Stable, so equal leaders keep first-seen order.
    groups.sort_by(|a, b| {
        let a_at = a.updates[0].created_at();
        let b_at = b.updates[0].created_at();
        b_at.cmp(&a_at)
    });
    groups
}

/// Distinct years present on the unfiltered timeline, newest first.
pub fn available_years(updates: &[ClientUpdate], tz: &FixedOffset) -> Vec<i32> {
    let years: BTreeSet<i32> = updates
        .iter()
        .map(|u| u.created_at.with_timezone(tz).year())
        .collect();
    years.into_iter().rev().collect()
}

pub fn unread_count(updates: &[ClientUpdate]) -> usize {
    updates.iter().filter(|u| !u.is_read()).count()
}
