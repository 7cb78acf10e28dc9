use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The source returned no records, so there is no best or worst entry to report.
    #[error("Empty data set: no {0} to summarize")]
    EmptyDataSet(&'static str),
}
