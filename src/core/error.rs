use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl CalcError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CalcError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
