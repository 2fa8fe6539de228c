//! Descriptive statistics over a lotto draw history.
//!
//! Every analyzer is a pure function over an ascending `&[DrawRecord]`;
//! [`report::build_report`] runs them all and merges the results.

pub mod combinatorial;
pub mod config;
pub mod dormancy;
pub mod error;
pub mod financial;
pub mod frequency;
pub mod insight;
pub mod math;
pub mod outlet;
pub mod pattern;
pub mod pension;
pub mod report;
pub mod tally;

pub use config::StatsConfig;
pub use error::StatsError;
pub use pension::{build_pension_report, PensionReport};
pub use report::{build_report, LottoReport};
