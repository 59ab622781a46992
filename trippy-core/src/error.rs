use thiserror::Error;

use crate::model::TableKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("`{table}` table does not contain any recognized columns or has no entries: {message}")]
    Schema { table: TableKind, message: String },
    #[error("You need to add a `{0}` table to this scenario to use this method")]
    MissingTable(TableKind),
    #[error("Column `{column}` does not exist in the scenario's `{table}` table")]
    MissingColumn { table: TableKind, column: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Data not found: {0}")]
    DataNotFound(String),
    #[error("Scenario with code '{0}' is not contained in the provided policy scenarios")]
    ScenarioNotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// True for both flavours of missing data: a whole table or one column of it
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Error::MissingTable(_) | Error::MissingColumn { .. })
    }
}
