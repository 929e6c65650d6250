use std::fmt::{self, Display};

use crate::{schema::Column, table::SalesTable};

/// Descriptive statistics for one numeric column.
///
/// Everything except `count` is `None` when the column has no values; `std`
/// is also `None` for a single value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub column: Option<Column>,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    /// Computes statistics over `values`, in any order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(column: Option<Column>, mut values: Vec<f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                column,
                ..Self::default()
            };
        }
        values.sort_by(f64::total_cmp);
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });
        Self {
            column,
            count,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            p25: Some(quantile(&values, 0.25)),
            median: Some(quantile(&values, 0.5)),
            p75: Some(quantile(&values, 0.75)),
            max: values.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantile(values: &[f64], q: f64) -> f64 {
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}

/// Statistics for every numeric column present in `table`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn describe(table: &SalesTable) -> Vec<ColumnStats> {
    let schema = table.schema();
    let records = table.records();
    let mut stats = Vec::new();
    if schema.has(Column::Quantity) {
        let values = records
            .iter()
            .filter_map(|r| r.quantity)
            .map(|q| q as f64)
            .collect();
        stats.push(ColumnStats::from_values(Some(Column::Quantity), values));
    }
    for column in [Column::UnitPrice, Column::LineRevenue] {
        if schema.has(column) {
            let values = records
                .iter()
                .filter_map(|r| r.amount(column))
                .map(|a| a.as_f64())
                .collect();
            stats.push(ColumnStats::from_values(Some(column), values));
        }
    }
    stats
}

/// Renders [`describe`] output as a table with one column per statistic.
pub struct Description<'a>(pub &'a [ColumnStats]);

impl Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No numeric columns found.");
        }
        let width = self
            .0
            .iter()
            .map(|s| s.column.map_or(0, |c| c.name().len()))
            .max()
            .unwrap_or(0)
            .max(6);
        writeln!(
            f,
            "{:width$} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
        )?;
        let length = width + 7 + 8 * 11;
        writeln!(f, "{:-<length$}", "")?;
        for s in self.0 {
            let name = s.column.map_or("", Column::name);
            write!(f, "{name:width$} {:>6}", s.count)?;
            for v in [s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max] {
                match v {
                    Some(v) => write!(f, " {v:>10.2}")?,
                    None => write!(f, " {:>10}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
