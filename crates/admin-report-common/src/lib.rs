pub mod error;
pub mod habits;
pub mod tasks;
pub mod types;

pub use error::{ReportError, Result};
pub use types::*;
