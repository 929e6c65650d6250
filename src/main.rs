use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use std::{
    io::{self, Write},
    path::PathBuf,
};

use salesdash::{
    group_sum, menu, top_n, Column, Dashboard, Filter, Groups, SalesTable, SchemaReport,
};

/// Reports revenue from a CSV file of retail sales line items.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the sales CSV file
    #[arg(short, long, global = true, default_value = "urbanmart_sales.csv")]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the revenue dashboard
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        groups: GroupArgs,
        /// Number of products and customers to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Print revenue grouped by one column
    Summary {
        /// Column to group by, e.g. store_location
        #[arg(long)]
        by: Column,
        /// Money column to sum
        #[arg(long, default_value = "line_revenue")]
        value: Column,
        /// Only show the largest N groups
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        groups: GroupArgs,
    },
    /// Show which known columns the file has
    Schema,
    /// Explore the data interactively
    Menu,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Earliest sale date to include (YYYY-MM-DD)
    #[arg(long = "from")]
    start: Option<NaiveDate>,
    /// Latest sale date to include (YYYY-MM-DD)
    #[arg(long = "to")]
    end: Option<NaiveDate>,
    /// Store to include; repeat for several, or use All
    #[arg(long = "store")]
    stores: Vec<String>,
    /// Channel to include, or All
    #[arg(long)]
    channel: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new().stores(self.stores.iter().cloned());
        if let Some(start) = self.start {
            filter = filter.start(start);
        }
        if let Some(end) = self.end {
            filter = filter.end(end);
        }
        if let Some(channel) = &self.channel {
            filter = filter.channel(channel.as_str());
        }
        filter
    }
}

#[derive(Debug, Args)]
struct GroupArgs {
    /// Product groups file (GROUP_NAME | GROUP_REGEX per line)
    #[arg(long = "groups")]
    path: Option<PathBuf>,
}

impl GroupArgs {
    fn apply(&self, table: SalesTable) -> Result<SalesTable> {
        let Some(path) = &self.path else {
            return Ok(table);
        };
        let groups = Groups::from_file(path)
            .with_context(|| format!("reading product groups from {}", path.display()))?;
        Ok(groups.relabel(&table))
    }
}

fn prepare(table: SalesTable, filter: &FilterArgs, groups: &GroupArgs) -> Result<SalesTable> {
    let table = table.filter(&filter.to_filter());
    groups.apply(table)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let table = SalesTable::load(&cli.file)
        .with_context(|| format!("loading sales data from {}", cli.file.display()))?;
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Report {
            filter,
            groups,
            top,
        } => {
            let table = prepare(table, &filter, &groups)?;
            let dashboard = Dashboard::build(&table, top)?;
            write!(stdout, "{dashboard}")?;
        }
        Command::Summary {
            by,
            value,
            top,
            filter,
            groups,
        } => {
            let table = prepare(table, &filter, &groups)?;
            let mut summary = group_sum(&table, by, value)?;
            if let Some(n) = top {
                summary = top_n(summary, n);
            }
            writeln!(stdout, "{by} by {value}")?;
            write!(stdout, "{summary}")?;
            writeln!(stdout, "Total {}", summary.total()?)?;
        }
        Command::Schema => {
            write!(stdout, "{}", SchemaReport(table.schema()))?;
        }
        Command::Menu => {
            let mut stdin = io::stdin().lock();
            menu::welcome(&mut stdout)?;
            let mode = menu::choose_mode(&mut stdin, &mut stdout)?;
            menu::overview(&table, mode, &mut stdout)?;
            menu::run(&table, mode, &mut stdin, &mut stdout)?;
        }
    }
    Ok(())
}
