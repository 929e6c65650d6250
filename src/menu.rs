use std::io::{BufRead, Write};

use log::debug;

use crate::{
    error::{Result, SalesError},
    report::{RecordList, SchemaReport},
    schema::Column,
    stats::{describe, Description},
    summary::{count_by, revenue_by, top_n},
    table::SalesTable,
};

/// Number of records shown by the "view top records" choice.
pub const TOP_RECORDS: usize = 5;

/// How much analysis the menu session does up front.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Record count, columns and channel counts only.
    Quick,
    /// Schema check, revenue by store, and numeric summary statistics.
    #[default]
    Full,
}

/// One choice from the main menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Statistics,
    TopRecords,
    Exit,
}

impl Choice {
    /// Parses a menu entry, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Choice::Statistics),
            "2" => Some(Choice::TopRecords),
            "3" => Some(Choice::Exit),
            _ => None,
        }
    }
}

pub fn welcome(out: &mut impl Write) -> Result<()> {
    let rule = "=".repeat(50);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "Welcome to the Sales Analysis")?;
    writeln!(out, "{rule}\n")?;
    Ok(())
}

/// Asks which loading strategy to use. An empty answer, or end of input,
/// picks [`Mode::Full`].
///
/// # Errors
///
/// Returns any error from reading `input` or writing `out`.
pub fn choose_mode(input: &mut impl BufRead, out: &mut impl Write) -> Result<Mode> {
    writeln!(out, "Choose data loading option:")?;
    writeln!(out, "A. Quick scan (record count and channel counts)")?;
    writeln!(out, "B. Full analysis (preferred for reports)")?;
    loop {
        write!(out, "Enter A or B (default B): ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(Mode::Full);
        };
        match line.trim().to_ascii_uppercase().as_str() {
            "A" => return Ok(Mode::Quick),
            "" | "B" => return Ok(Mode::Full),
            _ => writeln!(out, "Please enter A or B.")?,
        }
    }
}

/// Prints the start-up checks for `mode`.
///
/// # Errors
///
/// Returns any error from writing `out`.
pub fn overview(table: &SalesTable, mode: Mode, out: &mut impl Write) -> Result<()> {
    match mode {
        Mode::Quick => {
            writeln!(out, "Total records: {}", table.len())?;
            writeln!(out, "Columns: {}", table.schema().headers().join(", "))?;
            match count_by(table, Column::Channel) {
                Ok(counts) => {
                    writeln!(out, "Channel counts:")?;
                    write!(out, "{counts}")?;
                }
                Err(SalesError::Configuration(reason)) => {
                    writeln!(out, "Channel counts unavailable: {reason}")?;
                }
                Err(e) => return Err(e),
            }
        }
        Mode::Full => {
            writeln!(out, "Total records: {}", table.len())?;
            write!(out, "{}", SchemaReport(table.schema()))?;
            match revenue_by(table, Column::StoreLocation) {
                Ok(stores) => {
                    writeln!(out, "Top 5 stores by revenue:")?;
                    write!(out, "{}", top_n(stores, 5))?;
                }
                Err(SalesError::Configuration(reason)) => {
                    writeln!(out, "Store summary unavailable: {reason}")?;
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

/// Runs the menu until the user exits or `input` ends.
///
/// # Errors
///
/// Returns any error from reading `input` or writing `out`.
pub fn run(
    table: &SalesTable,
    mode: Mode,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    loop {
        writeln!(out, "\n--- Options ---")?;
        writeln!(out, "1. View summary statistics")?;
        writeln!(out, "2. View top records")?;
        writeln!(out, "3. Exit")?;
        write!(out, "Enter choice (1-3): ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            debug!("menu input closed");
            writeln!(out)?;
            return Ok(());
        };
        match Choice::parse(&line) {
            Some(Choice::Statistics) => match mode {
                Mode::Full => {
                    writeln!(out, "\nSummary Statistics:")?;
                    write!(out, "{}", Description(&describe(table)))?;
                }
                Mode::Quick => writeln!(out, "Total records: {}", table.len())?,
            },
            Some(Choice::TopRecords) => {
                writeln!(out, "\nFirst {TOP_RECORDS} records:")?;
                write!(out, "{}", RecordList::head(table, TOP_RECORDS))?;
            }
            Some(Choice::Exit) => {
                writeln!(out, "Goodbye!")?;
                return Ok(());
            }
            None => writeln!(out, "Invalid choice. Please try again.")?,
        }
    }
}

/// Reads one line, returning `None` at end of input.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn fixture() -> SalesTable {
        SalesTable::load("testdata/urbanmart_sales.csv").unwrap()
    }

    fn session(table: &SalesTable, mode: Mode, keys: &str) -> String {
        let mut out = Vec::new();
        run(table, mode, &mut Cursor::new(keys), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn choose_mode_fn_defaults_to_full() {
        let mut out = Vec::new();
        assert_eq!(choose_mode(&mut Cursor::new("\n"), &mut out).unwrap(), Mode::Full);
        assert_eq!(choose_mode(&mut Cursor::new(""), &mut out).unwrap(), Mode::Full);
        assert_eq!(choose_mode(&mut Cursor::new(" a \n"), &mut out).unwrap(), Mode::Quick);
    }

    #[test]
    fn choose_mode_fn_reprompts_on_unknown_answer() {
        let mut out = Vec::new();
        let mode = choose_mode(&mut Cursor::new("x\nb\n"), &mut out).unwrap();
        assert_eq!(mode, Mode::Full);
        assert!(String::from_utf8(out).unwrap().contains("Please enter A or B."));
    }

    #[test]
    fn run_fn_exits_on_choice_three() {
        let text = session(&fixture(), Mode::Full, "3\n1\n");
        assert!(text.contains("Goodbye!"));
        assert!(!text.contains("Summary Statistics"));
    }

    #[test]
    fn run_fn_rejects_invalid_choice_and_continues() {
        let text = session(&fixture(), Mode::Full, "9\n2\n3\n");
        assert!(text.contains("Invalid choice. Please try again."));
        assert!(text.contains("First 5 records:"));
        assert!(text.contains("Goodbye!"));
    }

    #[test]
    fn run_fn_shows_statistics_by_mode() {
        let table = fixture();
        let full = session(&table, Mode::Full, "1\n3\n");
        assert!(full.contains("Summary Statistics:"));
        assert!(full.contains("line_revenue"));
        let quick = session(&table, Mode::Quick, "1\n3\n");
        assert!(quick.contains("Total records: 12"));
        assert!(!quick.contains("Summary Statistics:"));
    }

    #[test]
    fn run_fn_stops_at_end_of_input() {
        let text = session(&fixture(), Mode::Quick, "2\n");
        assert!(text.contains("First 5 records:"));
        assert!(!text.contains("Goodbye!"));
    }

    #[test]
    fn overview_fn_reports_channel_counts_in_quick_mode() {
        let mut out = Vec::new();
        overview(&fixture(), Mode::Quick, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total records: 12"));
        assert!(text.contains("Channel counts:"));
        assert!(text.contains("Online"));
    }

    #[test]
    fn overview_fn_degrades_when_store_column_missing() {
        let table = SalesTable::load("testdata/minimal.csv").unwrap();
        let mut out = Vec::new();
        overview(&table, Mode::Full, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Store summary unavailable"));
    }
}
