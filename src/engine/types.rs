use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload kind carried by a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    /// Double-precision sample value
    Double,
    /// On/off gate signal
    Gate,
}

impl PortKind {
    /// Get a short lowercase name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            PortKind::Double => "double",
            PortKind::Gate => "gate",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Required type of a template field
///
/// Literal types are fixed at construction. `Reference` fields are inputs that
/// get late-bound to another module's port, optionally restricted to one port
/// kind. `Port` fields are outputs owned by the module itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Number,
    Text,
    Flag,
    Reference(Option<PortKind>),
    Port(PortKind),
}

impl FieldType {
    /// Reference restricted to a single port kind
    pub fn reference(kind: PortKind) -> Self {
        FieldType::Reference(Some(kind))
    }

    /// Reference accepting any port kind
    pub fn any_reference() -> Self {
        FieldType::Reference(None)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Reference(_))
    }

    pub fn is_port(&self) -> bool {
        matches!(self, FieldType::Port(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Number => f.write_str("number"),
            FieldType::Text => f.write_str("text"),
            FieldType::Flag => f.write_str("flag"),
            FieldType::Reference(Some(kind)) => write!(f, "ref<{}>", kind),
            FieldType::Reference(None) => f.write_str("ref<any>"),
            FieldType::Port(kind) => write!(f, "port<{}>", kind),
        }
    }
}

/// Literal construction argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl Literal {
    /// The literal type this value satisfies
    pub fn field_type(&self) -> FieldType {
        match self {
            Literal::Number(_) => FieldType::Number,
            Literal::Text(_) => FieldType::Text,
            Literal::Flag(_) => FieldType::Flag,
        }
    }

    /// Zero value for a literal field type
    pub fn default_for(field_type: FieldType) -> Option<Literal> {
        match field_type {
            FieldType::Number => Some(Literal::Number(0.0)),
            FieldType::Text => Some(Literal::Text(String::new())),
            FieldType::Flag => Some(Literal::Flag(false)),
            FieldType::Reference(_) | FieldType::Port(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Literal::Flag(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(value) => write!(f, "{}", value),
            Literal::Text(value) => write!(f, "{:?}", value),
            Literal::Flag(value) => write!(f, "{}", value),
        }
    }
}

/// Names one field on a module instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub(crate) module: String,
    pub(crate) field: String,
}

impl FieldRef {
    pub fn new(module: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            field: field.into(),
        }
    }

    /// Get the instance name
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Get the field name
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.field)
    }
}
