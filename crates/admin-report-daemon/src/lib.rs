pub mod config;
pub mod daemon;
pub mod reports;
pub mod server;
pub mod source;

pub use reports::{GenerateError, ReportGenerator};
pub use server::{AppState, ReportServer};
pub use source::{HttpSource, RecordSource, SourceError};
