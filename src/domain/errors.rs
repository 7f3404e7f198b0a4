use thiserror::Error;
use uuid::Uuid;

use super::models::CellValue;

/// Failure of a formula, surfaced to the grid as a sentinel display value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    #[error("#ERR")]
    Invalid,
    #[error("#CYCLE")]
    Cycle,
    /// The reference chain is longer than one read will follow.
    #[error("#ERR")]
    TooDeep,
}

impl FormulaError {
    pub const ERR_SENTINEL: &'static str = "#ERR";
    pub const CYCLE_SENTINEL: &'static str = "#CYCLE";

    pub fn sentinel(self) -> &'static str {
        match self {
            FormulaError::Invalid | FormulaError::TooDeep => Self::ERR_SENTINEL,
            FormulaError::Cycle => Self::CYCLE_SENTINEL,
        }
    }
}

impl From<FormulaError> for CellValue {
    fn from(err: FormulaError) -> Self {
        CellValue::Text(err.sentinel().to_string())
    }
}

/// Errors from the worksheet store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("worksheet {0} not found")]
    WorksheetNotFound(Uuid),

    #[error("row {0} not found")]
    RowNotFound(Uuid),

    #[error("column {0} not found")]
    ColumnNotFound(Uuid),
}

pub type StoreResult<T> = Result<T, StoreError>;
