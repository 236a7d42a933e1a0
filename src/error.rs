use thiserror::Error;

/// A selection value outside the loaded data's domain.
///
/// Returned by every state transition that rejects its input; the state it
/// was applied to is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("year {0} is not present in the dataset")]
    UnknownYear(i32),

    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("district {0} is not a known district code")]
    UnknownDistrict(u32),
}

impl SelectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SelectionError::UnknownYear(_) => "unknown_year",
            SelectionError::UnknownIndicator(_) => "unknown_indicator",
            SelectionError::UnknownDistrict(_) => "unknown_district",
        }
    }
}

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;
