use std::{
    fmt::{self, Display},
    str::FromStr,
};

use csv::StringRecord;

use crate::error::{Result, SalesError};

/// The columns the tool knows how to read from a sales file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Date,
    TransactionId,
    ProductCategory,
    ProductName,
    ProductId,
    StoreLocation,
    Channel,
    CustomerId,
    PaymentMethod,
    Quantity,
    UnitPrice,
    LineRevenue,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Date,
        Column::TransactionId,
        Column::ProductCategory,
        Column::ProductName,
        Column::ProductId,
        Column::StoreLocation,
        Column::Channel,
        Column::CustomerId,
        Column::PaymentMethod,
        Column::Quantity,
        Column::UnitPrice,
        Column::LineRevenue,
    ];

    /// Columns needed for the full set of reports.
    ///
    /// The product dimension is satisfied by either `product_name` or
    /// `product_id`, so neither is listed here; see
    /// [`Schema::product_column`].
    pub const REQUIRED: [Column; 6] = [
        Column::Date,
        Column::ProductCategory,
        Column::StoreLocation,
        Column::Channel,
        Column::CustomerId,
        Column::LineRevenue,
    ];

    /// The header name of this column.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::TransactionId => "transaction_id",
            Column::ProductCategory => "product_category",
            Column::ProductName => "product_name",
            Column::ProductId => "product_id",
            Column::StoreLocation => "store_location",
            Column::Channel => "channel",
            Column::CustomerId => "customer_id",
            Column::PaymentMethod => "payment_method",
            Column::Quantity => "quantity",
            Column::UnitPrice => "unit_price",
            Column::LineRevenue => "line_revenue",
        }
    }

    /// Whether the column holds money that can be summed into a [`crate::Usd`]
    /// total.
    #[must_use]
    pub fn is_money(self) -> bool {
        matches!(self, Column::UnitPrice | Column::LineRevenue)
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = SalesError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalise(s);
        Column::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| SalesError::Configuration(format!("unknown column {s:?}")))
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Whether a known column appears in the file's header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// The header row of a sales file, resolved against the known columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    headers: Vec<String>,
}

impl Schema {
    /// Builds a schema from a header row.
    ///
    /// Header names are normalised: trimmed, lower-cased, with spaces and
    /// hyphens replaced by underscores, so `Line Revenue` reads as
    /// `line_revenue`. Returns `None` if the header row is empty.
    #[must_use]
    pub fn from_headers(headers: &StringRecord) -> Option<Self> {
        let headers: Vec<String> = headers.iter().map(normalise).collect();
        if headers.iter().all(String::is_empty) {
            return None;
        }
        Some(Self { headers })
    }

    /// Every header, known or not, in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of `column` in the header row, if present.
    #[must_use]
    pub fn index(&self, column: Column) -> Option<usize> {
        self.headers.iter().position(|h| h == column.name())
    }

    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        self.index(column).is_some()
    }

    /// Returns the index of `column`.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Configuration`] if the column is absent.
    pub fn require(&self, column: Column) -> Result<usize> {
        self.index(column).ok_or_else(|| {
            SalesError::Configuration(format!("column {:?} not found in data", column.name()))
        })
    }

    /// Presence of every known column.
    #[must_use]
    pub fn presence(&self) -> Vec<(Column, Presence)> {
        Column::ALL
            .into_iter()
            .map(|c| {
                let p = if self.has(c) {
                    Presence::Present
                } else {
                    Presence::Absent
                };
                (c, p)
            })
            .collect()
    }

    /// Columns needed for the full report set that the file lacks.
    ///
    /// Includes [`Column::ProductName`] when neither product column exists.
    #[must_use]
    pub fn missing(&self) -> Vec<Column> {
        let mut missing: Vec<Column> = Column::REQUIRED
            .into_iter()
            .filter(|c| !self.has(*c))
            .collect();
        if self.product_column().is_none() {
            missing.push(Column::ProductName);
        }
        missing
    }

    /// The column identifying products: `product_name` if present, else
    /// `product_id`.
    #[must_use]
    pub fn product_column(&self) -> Option<Column> {
        [Column::ProductName, Column::ProductId]
            .into_iter()
            .find(|c| self.has(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(headers: &[&str]) -> Schema {
        Schema::from_headers(&StringRecord::from(headers.to_vec())).unwrap()
    }

    #[test]
    fn from_headers_fn_rejects_empty_header_row() {
        assert_eq!(Schema::from_headers(&StringRecord::new()), None);
        assert_eq!(Schema::from_headers(&StringRecord::from(vec!["", " "])), None);
    }

    #[test]
    fn from_headers_fn_normalises_header_names() {
        let s = schema(&[" Date", "Line Revenue", "store-location"]);
        assert_eq!(s.headers(), ["date", "line_revenue", "store_location"]);
        assert!(s.has(Column::LineRevenue));
    }

    #[test]
    fn require_fn_returns_configuration_error_for_absent_column() {
        let s = schema(&["date", "line_revenue"]);
        assert_eq!(s.require(Column::LineRevenue).unwrap(), 1);
        assert!(matches!(
            s.require(Column::Channel),
            Err(SalesError::Configuration(_))
        ));
    }

    #[test]
    fn presence_fn_reports_every_known_column() {
        let s = schema(&["channel", "unrelated"]);
        let presence = s.presence();
        assert_eq!(presence.len(), Column::ALL.len());
        assert!(presence.contains(&(Column::Channel, Presence::Present)));
        assert!(presence.contains(&(Column::Date, Presence::Absent)));
    }

    #[test]
    fn product_column_fn_prefers_name_over_id() {
        assert_eq!(
            schema(&["product_id", "product_name"]).product_column(),
            Some(Column::ProductName)
        );
        assert_eq!(
            schema(&["product_id"]).product_column(),
            Some(Column::ProductId)
        );
        assert_eq!(schema(&["date"]).product_column(), None);
    }

    #[test]
    fn missing_fn_lists_absent_required_columns() {
        let s = schema(&["date", "product_id", "channel", "line_revenue"]);
        assert_eq!(
            s.missing(),
            vec![
                Column::ProductCategory,
                Column::StoreLocation,
                Column::CustomerId
            ]
        );
    }

    #[test]
    fn column_from_str_accepts_header_names_and_loose_spelling() {
        assert_eq!("store_location".parse::<Column>().unwrap(), Column::StoreLocation);
        assert_eq!("Store-Location".parse::<Column>().unwrap(), Column::StoreLocation);
        assert!("bogus".parse::<Column>().is_err());
    }
}
