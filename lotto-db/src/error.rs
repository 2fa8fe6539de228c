use thiserror::Error;

/// Why a raw record could not become a typed one.
///
/// Only hard invariants end up here; optional fields fall back to defaults
/// during ingestion and are merely logged.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("draw {draw_no}: expected 6 distinct numbers in 1-45, got {numbers:?}")]
    InvalidNumbers { draw_no: u32, numbers: Vec<i64> },

    #[error("draw {draw_no}: bonus number {bonus} outside 1-45")]
    InvalidBonus { draw_no: u32, bonus: i64 },

    #[error("draw {draw_no}: `{raw}` is not a sequence of 6 digits")]
    InvalidDigits { draw_no: u32, raw: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
