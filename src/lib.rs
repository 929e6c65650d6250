#![doc = include_str!("../README.md")]
pub use self::{
    error::{Result, SalesError},
    filter::{Filter, Selection},
    groups::Groups,
    report::{Dashboard, RecordList, SchemaReport},
    schema::{Column, Presence, Schema},
    stats::{describe, ColumnStats, Description},
    summary::{count_by, daily_trend, group_sum, revenue_by, top_n, SummaryTable, Tally, UNKNOWN},
    table::{SalesRecord, SalesTable},
    usd::Usd,
};

mod error;
mod filter;
mod groups;
pub mod menu;
pub mod report;
mod schema;
mod stats;
mod summary;
mod table;
mod usd;
