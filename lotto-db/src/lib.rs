pub mod error;
pub mod ingest;
pub mod models;

pub use error::IngestError;
