use std::{
    borrow::Cow,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use log::{debug, warn};
use serde::Deserialize;

use crate::{
    error::{Result, SalesError},
    schema::{Column, Schema},
    usd::Usd,
};

/// One line item of the sales data.
///
/// Every field is optional: a column may be missing from the file, or a cell
/// may be empty. A `date` that could not be parsed is also `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalesRecord {
    pub date: Option<NaiveDateTime>,
    pub transaction_id: Option<String>,
    pub product_category: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub store_location: Option<String>,
    pub channel: Option<String>,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Usd>,
    pub line_revenue: Option<Usd>,
}

impl SalesRecord {
    /// The value of `column` used as a grouping key.
    ///
    /// Dates are keyed by their calendar day (`YYYY-MM-DD`), dropping any
    /// time of day.
    #[must_use]
    pub fn key(&self, column: Column) -> Option<Cow<'_, str>> {
        match column {
            Column::Date => self.day().map(|d| Cow::Owned(d.to_string())),
            Column::TransactionId => text(&self.transaction_id),
            Column::ProductCategory => text(&self.product_category),
            Column::ProductName => text(&self.product_name),
            Column::ProductId => text(&self.product_id),
            Column::StoreLocation => text(&self.store_location),
            Column::Channel => text(&self.channel),
            Column::CustomerId => text(&self.customer_id),
            Column::PaymentMethod => text(&self.payment_method),
            Column::Quantity => self.quantity.map(|q| Cow::Owned(q.to_string())),
            Column::UnitPrice => self.unit_price.map(|p| Cow::Owned(format!("{:.2}", p.as_f64()))),
            Column::LineRevenue => self
                .line_revenue
                .map(|r| Cow::Owned(format!("{:.2}", r.as_f64()))),
        }
    }

    /// The amount in `column`, if it is a money column and the cell has a
    /// value.
    #[must_use]
    pub fn amount(&self, column: Column) -> Option<Usd> {
        match column {
            Column::UnitPrice => self.unit_price,
            Column::LineRevenue => self.line_revenue,
            _ => None,
        }
    }

    /// The calendar day of the sale.
    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.map(|d| d.date())
    }
}

fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

/// The CSV format for sales data, before dates are interpreted.
#[derive(Debug, Deserialize)]
struct Record {
    date: Option<String>,
    transaction_id: Option<String>,
    product_category: Option<String>,
    product_name: Option<String>,
    product_id: Option<String>,
    store_location: Option<String>,
    channel: Option<String>,
    customer_id: Option<String>,
    payment_method: Option<String>,
    quantity: Option<String>,
    unit_price: Option<String>,
    line_revenue: Option<Usd>,
}

/// Sales line items loaded from one file, together with the file's schema.
///
/// A table is never modified once loaded. [`SalesTable::filter`] returns a
/// new table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalesTable {
    schema: Schema,
    records: Vec<SalesRecord>,
}

impl SalesTable {
    /// Creates a table from already-parsed records.
    #[must_use]
    pub fn new(schema: Schema, records: Vec<SalesRecord>) -> Self {
        Self { schema, records }
    }

    /// Loads sales data from the CSV file at `path`.
    ///
    /// The file must have a header row. Unknown columns are ignored and known
    /// columns that are missing leave the corresponding record fields empty.
    /// Dates, quantities and unit prices that cannot be parsed become `None`
    /// instead of failing the load. A quantity written as a whole-valued
    /// decimal such as `2.0` is accepted. Line revenue is what every report
    /// sums, so a malformed `line_revenue` cell is an error.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file does not exist ([`SalesError::NotFound`])
    /// * The file cannot be opened or read ([`SalesError::Io`])
    /// * The header row is missing, a row has the wrong number of fields, or
    ///   a `line_revenue` cell is malformed ([`SalesError::Format`])
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SalesError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SalesError::Io(e),
        })?;
        Self::from_reader(file, path)
    }

    /// Loads sales data from `reader`, naming `source` in any error.
    ///
    /// # Errors
    ///
    /// As for [`SalesTable::load`], apart from [`SalesError::NotFound`].
    pub fn from_reader(reader: impl Read, source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| format_error(source, &e))?
            .clone();
        let schema = Schema::from_headers(&headers).ok_or_else(|| SalesError::Format {
            path: source.to_path_buf(),
            line: 1,
            reason: "missing header row".into(),
        })?;
        rdr.set_headers(StringRecord::from(schema.headers().to_vec()));

        let mut records = Vec::new();
        let mut bad_dates = 0;
        let mut bad_numbers = 0_usize;
        for result in rdr.deserialize() {
            let raw: Record = result.map_err(|e| format_error(source, &e))?;
            let date = raw.date.as_deref().and_then(|d| {
                let parsed = parse_timestamp(d);
                if parsed.is_none() {
                    bad_dates += 1;
                }
                parsed
            });
            let quantity = lenient(raw.quantity.as_deref(), parse_quantity, &mut bad_numbers);
            let unit_price = lenient(
                raw.unit_price.as_deref(),
                |s| Usd::from_str(s).ok(),
                &mut bad_numbers,
            );
            records.push(SalesRecord {
                date,
                transaction_id: raw.transaction_id,
                product_category: raw.product_category,
                product_name: raw.product_name,
                product_id: raw.product_id,
                store_location: raw.store_location,
                channel: raw.channel,
                customer_id: raw.customer_id,
                payment_method: raw.payment_method,
                quantity,
                unit_price,
                line_revenue: raw.line_revenue,
            });
        }
        if bad_dates > 0 {
            warn!(
                "{}: {bad_dates} unparseable date(s) treated as missing",
                source.display()
            );
        }
        if bad_numbers > 0 {
            warn!(
                "{}: {bad_numbers} unparseable quantity or unit price cell(s) treated as missing",
                source.display()
            );
        }
        debug!(
            "{}: loaded {} records with columns {:?}",
            source.display(),
            records.len(),
            schema.headers()
        );
        Ok(Self { schema, records })
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `n` records.
    #[must_use]
    pub fn head(&self, n: usize) -> &[SalesRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Returns a new table holding the records for which `keep` is true.
    #[must_use]
    pub fn retain(&self, keep: impl Fn(&SalesRecord) -> bool) -> Self {
        Self {
            schema: self.schema.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Returns a new table with `f` applied to a copy of every record.
    #[must_use]
    pub fn map(&self, f: impl Fn(&mut SalesRecord)) -> Self {
        Self {
            schema: self.schema.clone(),
            records: self
                .records
                .iter()
                .cloned()
                .map(|mut r| {
                    f(&mut r);
                    r
                })
                .collect(),
        }
    }
}

fn format_error(source: &Path, err: &csv::Error) -> SalesError {
    SalesError::Format {
        path: PathBuf::from(source),
        line: err.position().map_or(0, csv::Position::line),
        reason: match err.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            _ => err.to_string(),
        },
    }
}

/// Parses an optional cell, counting cells that are present but unreadable.
fn lenient<T>(
    cell: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    bad: &mut usize,
) -> Option<T> {
    let parsed = parse(cell?);
    if parsed.is_none() {
        *bad += 1;
    }
    parsed
}

/// Parses a unit count, accepting whole-valued decimals like `2.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn parse_quantity(s: &str) -> Option<i64> {
    if let Ok(n) = s.parse() {
        return Some(n);
    }
    let value: f64 = s.parse().ok()?;
    let whole = value.is_finite()
        && value.fract() == 0.0
        && (i64::MIN as f64..i64::MAX as f64).contains(&value);
    whole.then_some(value as i64)
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses a sale timestamp.
///
/// Accepts a bare date (`2024-03-01`, `03/01/2024`, `01-03-2024`), a date and
/// time (`2024-03-01 14:05:00`, `2024-03-01T14:05:00.250`) or an RFC 3339
/// timestamp with offset, whose local time is kept. Returns `None` when
/// nothing matches.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    if let Some(ts) = DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(ts);
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}
