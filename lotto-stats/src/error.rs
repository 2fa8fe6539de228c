use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// Every ratio is degenerate without at least one draw.
    #[error("no draw records to analyze")]
    EmptyHistory,
}
