use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::debug;

use crate::table::{SalesRecord, SalesTable};

/// The value meaning "no constraint" for store and channel selections.
pub const ALL: &str = "All";

/// A choice of zero or more values for one dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// No constraint.
    #[default]
    All,
    /// Match any of these values.
    Only(BTreeSet<String>),
}

impl Selection {
    /// Builds a selection from user-supplied values.
    ///
    /// No values, or any value equal to [`ALL`], means no constraint.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() || values.contains(ALL) {
            Selection::All
        } else {
            Selection::Only(values)
        }
    }

    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => value.is_some_and(|v| values.contains(v)),
        }
    }
}

/// Criteria for narrowing a [`SalesTable`].
///
/// Every criterion is optional, and an empty `Filter` keeps every record.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use salesdash::Filter;
/// let filter = Filter::new()
///     .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
///     .stores(["Downtown", "Uptown"])
///     .channel("Online");
/// assert!(!filter.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub stores: Selection,
    pub channel: Option<String>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps records on or after `date`.
    #[must_use]
    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    /// Keeps records on or before `date`.
    #[must_use]
    pub fn end(mut self, date: NaiveDate) -> Self {
        self.end = Some(date);
        self
    }

    /// Keeps records from any of `stores`.
    #[must_use]
    pub fn stores<I, S>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stores = Selection::from_values(stores);
        self
    }

    /// Keeps records from `channel`, unless it is [`ALL`].
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        self.channel = (channel != ALL).then_some(channel);
        self
    }

    /// Whether this filter constrains nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.stores == Selection::All
            && self.channel.is_none()
    }

    /// Whether `record` satisfies every criterion.
    ///
    /// Date bounds are inclusive and compare calendar days only. When either
    /// bound is set, a record with no date never matches.
    #[must_use]
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if self.start.is_some() || self.end.is_some() {
            let Some(day) = record.day() else {
                return false;
            };
            if self.start.is_some_and(|start| day < start) {
                return false;
            }
            if self.end.is_some_and(|end| day > end) {
                return false;
            }
        }
        if !self.stores.matches(record.store_location.as_deref()) {
            return false;
        }
        match &self.channel {
            Some(channel) => record.channel.as_deref() == Some(channel.as_str()),
            None => true,
        }
    }
}

impl SalesTable {
    /// Returns a new table holding only the records that match `filter`.
    ///
    /// The original table is left untouched. An empty result is not an
    /// error.
    #[must_use]
    pub fn filter(&self, filter: &Filter) -> SalesTable {
        if filter.is_empty() {
            return self.clone();
        }
        let filtered = self.retain(|r| filter.matches(r));
        debug!(
            "filter {filter:?} kept {} of {} records",
            filtered.len(),
            self.len()
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{summary::revenue_by, Column, Usd};

    fn fixture() -> SalesTable {
        SalesTable::load("testdata/urbanmart_sales.csv").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn revenue(table: &SalesTable) -> Usd {
        table.records().iter().filter_map(|r| r.line_revenue).sum()
    }

    #[test]
    fn empty_filter_keeps_every_record() {
        let table = fixture();
        assert_eq!(table.filter(&Filter::new()), table);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let table = fixture();
        let filtered = table.filter(&Filter::new().start(day(4)).end(day(5)));
        assert_eq!(filtered.len(), 4);
        assert!(filtered
            .records()
            .iter()
            .all(|r| r.day().is_some_and(|d| d >= day(4) && d <= day(5))));
        assert_eq!(revenue(&filtered), Usd::from_cents(20_100));
    }

    #[test]
    fn inverted_date_range_returns_empty_table() {
        let filtered = fixture().filter(&Filter::new().start(day(6)).end(day(5)));
        assert!(filtered.is_empty());
        assert_eq!(filtered.schema(), fixture().schema());
    }

    #[test]
    fn date_bound_excludes_records_with_missing_date() {
        let filtered = fixture().filter(&Filter::new().start(day(1)));
        assert_eq!(filtered.len(), 11);
        assert!(filtered.records().iter().all(|r| r.date.is_some()));
    }

    #[test]
    fn store_set_uses_or_semantics_and_channel_narrows() {
        let table = fixture();
        let both = table.filter(&Filter::new().stores(["Downtown", "Suburb"]));
        assert_eq!(both.len(), 8);
        let online_downtown = table.filter(&Filter::new().stores(["Downtown"]).channel("Online"));
        assert_eq!(online_downtown.len(), 3);
        assert_eq!(revenue(&online_downtown), Usd::from_cents(3_700));
    }

    #[test]
    fn all_sentinel_means_no_constraint() {
        let table = fixture();
        let filter = Filter::new().stores(["All"]).channel("All");
        assert!(filter.is_empty());
        assert_eq!(table.filter(&filter).len(), table.len());
        assert_eq!(Selection::from_values(Vec::<String>::new()), Selection::All);
    }

    #[test]
    fn filter_is_idempotent() {
        let table = fixture();
        let filter = Filter::new().start(day(4)).stores(["Uptown", "Downtown"]).channel("In-store");
        let once = table.filter(&filter);
        let twice = once.filter(&filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_does_not_modify_input() {
        let table = fixture();
        let before = table.clone();
        let _ = table.filter(&Filter::new().channel("Online"));
        assert_eq!(table, before);
    }

    #[test]
    fn unknown_store_yields_empty_but_valid_table() {
        let filtered = fixture().filter(&Filter::new().stores(["Nowhere"]));
        assert!(filtered.is_empty());
        assert!(revenue_by(&filtered, Column::StoreLocation).unwrap().is_empty());
    }
}
