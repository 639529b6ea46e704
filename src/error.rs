use crate::age_bracket::AgeBracket;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// A license-holder count of zero leaves the accident rate undefined.
    #[error("license count for age bracket '{bracket}' is zero, accident rate is undefined")]
    DivisionByZero { bracket: AgeBracket },

    #[error("age label table is invalid: {0}")]
    LabelTable(String),

    #[error("license reference table is invalid: {0}")]
    Reference(String),
}
