use crate::engine::types::FieldRef;
use thiserror::Error;

/// Errors raised while building, binding, or ticking a patch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Duplicate field '{0}'")]
    DuplicateField(String),
    #[error("Unknown field '{field}' on '{owner}'")]
    UnknownField { owner: String, field: String },
    #[error("Missing required field '{field}' for '{owner}'")]
    MissingField { owner: String, field: String },
    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("Unresolved reference {target} from module '{module}': {reason}")]
    UnresolvedReference {
        module: String,
        target: FieldRef,
        reason: String,
    },
    #[error("Cycle detected between modules: {}", .0.join(", "))]
    CyclicGraph(Vec<String>),
    #[error("Module '{0}' is not bound")]
    NotBound(String),
    #[error("Patch has no schedule; bind_all must succeed before ticking")]
    PatchNotBound,
    #[error("Unknown module kind '{0}'")]
    UnknownKind(String),
    #[error("Module kind '{0}' is already registered")]
    DuplicateKind(String),
    #[error("Module '{0}' already exists")]
    DuplicateModule(String),
    #[error("Module '{0}' not found")]
    UnknownModule(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PatchError {
    /// Build a type mismatch from anything displayable
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        PatchError::TypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn unknown_field(owner: impl Into<String>, field: impl Into<String>) -> Self {
        PatchError::UnknownField {
            owner: owner.into(),
            field: field.into(),
        }
    }
}
