use log::warn;

use std::fmt::{self, Display};

use crate::{
    error::{Result, SalesError},
    schema::{Column, Presence, Schema},
    summary::{daily_trend, revenue_by, top_n, SummaryTable},
    table::{SalesRecord, SalesTable},
    usd::Usd,
};

/// Number of raw records shown at the foot of the dashboard.
pub const SAMPLE_ROWS: usize = 20;

/// One titled block of the dashboard.
#[derive(Debug)]
pub struct Section {
    pub title: String,
    pub key_label: String,
    pub body: SectionBody,
}

#[derive(Debug)]
pub enum SectionBody {
    Summary(SummaryTable<Usd>),
    /// The section could not be computed; the text says why.
    Skipped(String),
}

/// The revenue dashboard for one (possibly filtered) table.
///
/// To build it, use [`Dashboard::build`]. To get a printable version, use its
/// [`Display`] implementation.
#[derive(Debug)]
pub struct Dashboard<'a> {
    table: &'a SalesTable,
    sections: Vec<Section>,
}

impl<'a> Dashboard<'a> {
    /// Computes every dashboard section for `table`, listing the top `top`
    /// products and customers.
    ///
    /// Sections whose column is missing from the table are skipped with a
    /// note rather than failing the whole dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Configuration`] if the table has no
    /// `line_revenue` column, since no section can be computed without it.
    pub fn build(table: &'a SalesTable, top: usize) -> Result<Self> {
        table.schema().require(Column::LineRevenue)?;
        let mut sections = vec![
            section("Revenue by Category", "Category", revenue_by(table, Column::ProductCategory)),
            section("Revenue by Store", "Store Location", revenue_by(table, Column::StoreLocation)),
            section("Revenue by Channel", "Channel", revenue_by(table, Column::Channel)),
            section(
                "Daily Revenue Trend",
                "Date",
                daily_trend(table).map(SummaryTable::chronological),
            ),
        ];
        sections.push(match table.schema().product_column() {
            Some(column) => section(
                &format!("Top {top} Products by Revenue"),
                column.name(),
                revenue_by(table, column).map(|s| top_n(s, top)),
            ),
            None => skipped(
                &format!("Top {top} Products by Revenue"),
                "No product column found.",
            ),
        });
        sections.push(if table.schema().has(Column::CustomerId) {
            section(
                &format!("Top {top} Customers by Revenue"),
                Column::CustomerId.name(),
                revenue_by(table, Column::CustomerId).map(|s| top_n(s, top)),
            )
        } else {
            skipped(
                &format!("Top {top} Customers by Revenue"),
                "No customer_id column found.",
            )
        });
        Ok(Self { table, sections })
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The section titled `title`, if any.
    #[must_use]
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

fn section(title: &str, key_label: &str, summary: Result<SummaryTable<Usd>>) -> Section {
    match summary.and_then(|summary| summary.total().map(|_| summary)) {
        Ok(summary) => Section {
            title: title.to_string(),
            key_label: key_label.to_string(),
            body: SectionBody::Summary(summary),
        },
        Err(SalesError::Configuration(reason)) => {
            warn!("skipping {title:?}: {reason}");
            skipped(title, &format!("Skipped: {reason}."))
        }
        Err(e) => {
            warn!("skipping {title:?}: {e}");
            skipped(title, &format!("Skipped: {e}."))
        }
    }
}

fn skipped(title: &str, note: &str) -> Section {
    Section {
        title: title.to_string(),
        key_label: String::new(),
        body: SectionBody::Skipped(note.to_string()),
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let summary = match &self.body {
            SectionBody::Summary(summary) => summary,
            SectionBody::Skipped(note) => return writeln!(f, "{note}"),
        };
        if summary.is_empty() {
            return writeln!(f, "No data.");
        }
        let width = summary
            .entries()
            .iter()
            .map(|(k, _)| k.len())
            .chain([self.key_label.len(), "Total".len()])
            .max()
            .unwrap_or(0);
        writeln!(f, "{:width$} {:>12}", self.key_label, "Revenue")?;
        let length = width + 13;
        writeln!(f, "{:-<length$}", "")?;
        for (key, revenue) in summary.entries() {
            writeln!(f, "{key:width$} {revenue}")?;
        }
        writeln!(f, "{:-<length$}", "")?;
        match summary.total() {
            Ok(total) => writeln!(f, "{:width$} {total}", "Total"),
            Err(_) => writeln!(f, "{:width$} {:>12}", "Total", "overflow"),
        }
    }
}

impl Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records: {}", self.table.len())?;
        for section in &self.sections {
            writeln!(f)?;
            write!(f, "{section}")?;
        }
        writeln!(f)?;
        writeln!(f, "Sample of Filtered Raw Data")?;
        if self.table.is_empty() {
            writeln!(f, "No data available for the selected filters.")?;
        } else {
            write!(f, "{}", RecordList::head(self.table, SAMPLE_ROWS))?;
        }
        Ok(())
    }
}

/// Renders records as an aligned text table.
///
/// The product is shown by name, or by id when the table has no
/// `product_name` column.
#[derive(Debug)]
pub struct RecordList<'a> {
    records: &'a [SalesRecord],
    product: Column,
}

impl<'a> RecordList<'a> {
    /// Lists the first `n` records of `table`.
    #[must_use]
    pub fn head(table: &'a SalesTable, n: usize) -> Self {
        Self {
            records: table.head(n),
            product: table.schema().product_column().unwrap_or(Column::ProductName),
        }
    }

    fn columns(&self) -> [Column; 7] {
        [
            Column::Date,
            Column::StoreLocation,
            Column::Channel,
            Column::ProductCategory,
            self.product,
            Column::CustomerId,
            Column::LineRevenue,
        ]
    }
}

impl Display for RecordList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listed = self.columns();
        let cells: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| {
                listed
                    .iter()
                    .map(|c| match c {
                        Column::Date => r.date.map(|d| d.to_string()),
                        _ => r.key(*c).map(|k| k.into_owned()),
                    }
                    .unwrap_or_else(|| "-".into()))
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = listed
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain([c.name().len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let header: Vec<&str> = listed.iter().map(|c| c.name()).collect();
        write_row(f, &header, &widths)?;
        for row in &cells {
            let row: Vec<&str> = row.iter().map(String::as_str).collect();
            write_row(f, &row, &widths)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &[&str], widths: &[usize]) -> fmt::Result {
    for (i, (cell, width)) in row.iter().zip(widths.iter().copied()).enumerate() {
        if i + 1 == row.len() {
            write!(f, "{cell:>width$}")?;
        } else {
            write!(f, "{cell:width$}  ")?;
        }
    }
    writeln!(f)
}

/// Renders a schema as one line per known column, marking missing ones.
pub struct SchemaReport<'a>(pub &'a Schema);

impl Display for SchemaReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Columns: {}", self.0.headers().join(", "))?;
        for (column, presence) in self.0.presence() {
            let mark = match presence {
                Presence::Present => "present",
                Presence::Absent => "missing",
            };
            writeln!(f, "  {:16} {mark}", column.name())?;
        }
        let missing = self.0.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|c| c.name()).collect();
            writeln!(
                f,
                "Reports needing {} will be skipped.",
                names.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filter;

    fn fixture() -> SalesTable {
        SalesTable::load("testdata/urbanmart_sales.csv").unwrap()
    }

    fn summary<'a>(dashboard: &'a Dashboard<'_>, title: &str) -> &'a SummaryTable<Usd> {
        match &dashboard.section(title).unwrap().body {
            SectionBody::Summary(s) => s,
            SectionBody::Skipped(note) => panic!("{title} skipped: {note}"),
        }
    }

    #[test]
    fn build_fn_computes_every_section() {
        let table = fixture();
        let dashboard = Dashboard::build(&table, 5).unwrap();
        assert_eq!(dashboard.sections().len(), 6);
        let stores = summary(&dashboard, "Revenue by Store");
        assert_eq!(
            stores.entries().iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            ["Downtown", "Uptown", "Suburb"]
        );
        let trend = summary(&dashboard, "Daily Revenue Trend");
        assert_eq!(trend.entries()[0].0, "2024-01-03");
        let customers = summary(&dashboard, "Top 5 Customers by Revenue");
        assert_eq!(customers.len(), 5);
        assert_eq!(customers.entries()[0], ("C001".to_string(), Usd::from_cents(11_000)));
    }

    #[test]
    fn build_fn_skips_sections_for_missing_columns() {
        let table = SalesTable::load("testdata/minimal.csv").unwrap();
        let dashboard = Dashboard::build(&table, 5).unwrap();
        let skipped: Vec<&str> = dashboard
            .sections()
            .iter()
            .filter(|s| matches!(s.body, SectionBody::Skipped(_)))
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(
            skipped,
            [
                "Revenue by Category",
                "Revenue by Store",
                "Top 5 Products by Revenue",
                "Top 5 Customers by Revenue"
            ]
        );
        let text = dashboard.to_string();
        assert!(text.contains("No product column found."));
        assert!(text.contains("No customer_id column found."));
    }

    #[test]
    fn build_fn_requires_revenue_column() {
        let data = "date,channel\n2024-01-01,Online\n";
        let table = SalesTable::from_reader(data.as_bytes(), "norev.csv").unwrap();
        assert!(matches!(
            Dashboard::build(&table, 5),
            Err(SalesError::Configuration(_))
        ));
    }

    #[test]
    fn display_reports_empty_filter_result() {
        let table = fixture().filter(&Filter::new().channel("Carrier pigeon"));
        let text = Dashboard::build(&table, 5).unwrap().to_string();
        assert!(text.starts_with("Records: 0\n"));
        assert!(text.contains("No data available for the selected filters."));
    }

    #[test]
    fn section_display_lists_entries_and_total() {
        let table = fixture();
        let dashboard = Dashboard::build(&table, 5).unwrap();
        let text = dashboard.section("Revenue by Channel").unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Revenue by Channel");
        assert_eq!(lines[1], "Channel       Revenue");
        assert_eq!(lines[3], "In-store       265.00");
        assert_eq!(lines[4], "Online         148.00");
        assert_eq!(lines[6], "Total          413.00");
    }

    #[test]
    fn record_list_renders_header_and_rows() {
        let table = fixture();
        let text = RecordList::head(&table, 2).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date"));
        assert!(lines[0].contains("product_name"));
        assert!(lines[1].contains("Organic Apples"));
        assert!(lines[1].ends_with("10.00"));
    }

    #[test]
    fn record_list_shows_product_id_without_product_name() {
        let data = "date,product_id,channel,line_revenue\n2024-01-01,SKU-42,Online,9.50\n";
        let table = SalesTable::from_reader(data.as_bytes(), "ids.csv").unwrap();
        let text = RecordList::head(&table, 5).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("product_id"));
        assert!(!lines[0].contains("product_name"));
        assert!(lines[1].contains("SKU-42"));
    }

    #[test]
    fn build_fn_skips_section_whose_total_overflows() {
        let data = "store_location,channel,line_revenue\nA,Online,5e16\nB,Online,5e16\n";
        let table = SalesTable::from_reader(data.as_bytes(), "huge.csv").unwrap();
        let dashboard = Dashboard::build(&table, 5).unwrap();
        assert!(matches!(
            dashboard.section("Revenue by Store").unwrap().body,
            SectionBody::Skipped(_)
        ));
        assert!(dashboard.to_string().contains("outside the supported amount range"));
    }

    #[test]
    fn schema_report_names_missing_columns() {
        let table = SalesTable::load("testdata/minimal.csv").unwrap();
        let text = SchemaReport(table.schema()).to_string();
        assert!(text.starts_with("Columns: date, channel, line_revenue\n"));
        assert!(text.contains("store_location   missing"));
        assert!(text.contains("Reports needing product_category"));
    }
}
