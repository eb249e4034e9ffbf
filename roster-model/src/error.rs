use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required draft field was blank.
    MissingField(&'static str),
    /// No role was selected.
    EmptyRoleSelection,
    /// A selected role is not part of the loaded catalog.
    UnknownRole(String),
    /// A user id could not be parsed.
    InvalidId(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingField(field) => {
                write!(f, "{field} must not be empty")
            }
            ModelError::EmptyRoleSelection => {
                write!(f, "at least one role must be selected")
            }
            ModelError::UnknownRole(name) => write!(f, "unknown role: {name}"),
            ModelError::InvalidId(raw) => write!(f, "invalid user id: {raw}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
