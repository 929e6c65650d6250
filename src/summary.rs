use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Display},
};

use crate::{
    error::{Result, SalesError},
    schema::Column,
    table::SalesTable,
    usd::Usd,
};

/// Key under which [`count_by`] counts records that have no value for the
/// grouping column.
pub const UNKNOWN: &str = "Unknown";

/// A value that can be accumulated into a [`SummaryTable`].
pub trait Tally: Copy + Default {
    /// Adds two values, returning `None` on overflow.
    fn checked_add(self, rhs: Self) -> Option<Self>;
}

impl Tally for Usd {
    fn checked_add(self, rhs: Self) -> Option<Self> {
        Usd::checked_add(self, rhs)
    }
}

impl Tally for usize {
    fn checked_add(self, rhs: Self) -> Option<Self> {
        usize::checked_add(self, rhs)
    }
}

/// Totals keyed by the values of one column, largest total first.
///
/// Entries with equal totals keep the order in which their keys first
/// appeared in the source table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryTable<V = Usd> {
    entries: Vec<(String, V)>,
}

impl<V: Ord> SummaryTable<V> {
    /// Builds a summary from `(key, total)` pairs in first-occurrence order,
    /// sorting them by descending total.
    #[must_use]
    pub fn from_unsorted(mut entries: Vec<(String, V)>) -> Self {
        // stable, so ties stay in first-occurrence order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }
}

impl<V> SummaryTable<V> {
    #[must_use]
    pub fn entries(&self) -> &[(String, V)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The total for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The entries re-ordered by key.
    ///
    /// Daily keys are `YYYY-MM-DD`, so this puts a daily trend in calendar
    /// order.
    #[must_use]
    pub fn chronological(mut self) -> Self {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    /// The sum of every entry.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Overflow`] if the sum does not fit in `V`.
    pub fn total(&self) -> Result<V>
    where
        V: Tally,
    {
        self.entries.iter().try_fold(V::default(), |sum, (_, v)| {
            sum.checked_add(*v).ok_or_else(|| SalesError::Overflow {
                key: "Total".to_string(),
            })
        })
    }
}

/// Accumulates `(key, value)` pairs into first-occurrence-ordered entries.
fn accumulate<'a, V, I>(pairs: I) -> Result<SummaryTable<V>>
where
    V: Tally + Ord,
    I: IntoIterator<Item = (Cow<'a, str>, V)>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, V)> = Vec::new();
    for (key, value) in pairs {
        match index.get(&*key) {
            Some(&i) => {
                let (key, total) = &mut entries[i];
                *total = total
                    .checked_add(value)
                    .ok_or_else(|| SalesError::Overflow { key: key.clone() })?;
            }
            None => {
                index.insert(key.to_string(), entries.len());
                entries.push((key.into_owned(), value));
            }
        }
    }
    Ok(SummaryTable::from_unsorted(entries))
}

impl<V: Display> Display for SummaryTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(k, _)| k.len())
            .max()
            .unwrap_or(0);
        for (key, total) in &self.entries {
            writeln!(f, "{key:width$} {total:>12}")?;
        }
        Ok(())
    }
}

/// Sums `value` for each distinct value of `group`.
///
/// Records where either the key or the value is missing are skipped.
///
/// # Errors
///
/// Returns [`SalesError::Configuration`] if either column is absent from the
/// table, or if `value` is not a money column. Returns
/// [`SalesError::Overflow`] if a group's total does not fit in [`Usd`].
pub fn group_sum(table: &SalesTable, group: Column, value: Column) -> Result<SummaryTable<Usd>> {
    table.schema().require(group)?;
    table.schema().require(value)?;
    if !value.is_money() {
        return Err(SalesError::Configuration(format!(
            "column {:?} cannot be summed",
            value.name()
        )));
    }
    accumulate(
        table
            .records()
            .iter()
            .filter_map(|r| Some((r.key(group)?, r.amount(value)?))),
    )
}

/// Total line revenue for each distinct value of `group`.
///
/// # Errors
///
/// As for [`group_sum`].
pub fn revenue_by(table: &SalesTable, group: Column) -> Result<SummaryTable<Usd>> {
    group_sum(table, group, Column::LineRevenue)
}

/// Total line revenue per calendar day, ignoring time of day.
///
/// # Errors
///
/// As for [`group_sum`].
pub fn daily_trend(table: &SalesTable) -> Result<SummaryTable<Usd>> {
    revenue_by(table, Column::Date)
}

/// Number of records for each distinct value of `group`.
///
/// Records with no value for `group` are counted under [`UNKNOWN`], so the
/// counts always add up to the number of records.
///
/// # Errors
///
/// Returns [`SalesError::Configuration`] if `group` is absent from the table.
pub fn count_by(table: &SalesTable, group: Column) -> Result<SummaryTable<usize>> {
    table.schema().require(group)?;
    accumulate(table.records().iter().map(|r| {
        let key = r.key(group).unwrap_or(Cow::Borrowed(UNKNOWN));
        (key, 1)
    }))
}

/// The first `n` entries of `summary`.
#[must_use]
pub fn top_n<V>(mut summary: SummaryTable<V>, n: usize) -> SummaryTable<V> {
    summary.entries.truncate(n);
    summary
}
