use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldType, Literal, PortKind};
use crate::engine::values::port::{Port, PortHandle, PortValue};
use crate::engine::values::reference::Reference;
use std::sync::Arc;

/// Value held in one slot of a module's field table
#[derive(Debug, Clone)]
pub enum Field {
    /// Construction-time constant
    Literal(Literal),
    /// Output port owned by the module
    Port(PortHandle),
    /// Input still pointing at some other value source
    Reference(Reference),
}

impl Field {
    /// Short description used in type mismatch reports
    pub fn describe(&self) -> String {
        match self {
            Field::Literal(literal) => literal.field_type().to_string(),
            Field::Port(port) => FieldType::Port(port.kind()).to_string(),
            Field::Reference(reference) => FieldType::Reference(reference.restriction()).to_string(),
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Field::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_port(&self) -> Option<&PortHandle> {
        match self {
            Field::Port(port) => Some(port),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Field::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Check `self` against `declared`, converting where a conversion is defined
    ///
    /// Numeric and flag literals placed in a reference slot become direct
    /// references to a fresh constant port. A bare port handle in a reference
    /// slot becomes a direct reference to that port. Port slots accept nothing.
    pub fn coerce(self, field: &str, declared: FieldType) -> Result<Field, PatchError> {
        let mismatch = |found: &Field| PatchError::mismatch(field, declared, found.describe());

        match (declared, self) {
            (FieldType::Number, value @ Field::Literal(Literal::Number(_)))
            | (FieldType::Text, value @ Field::Literal(Literal::Text(_)))
            | (FieldType::Flag, value @ Field::Literal(Literal::Flag(_))) => Ok(value),

            (FieldType::Reference(restriction), Field::Literal(Literal::Number(value)))
                if accepts(restriction, PortKind::Double) =>
            {
                Ok(Field::Reference(Reference::direct(PortHandle::from(value))))
            }
            (FieldType::Reference(restriction), Field::Literal(Literal::Flag(value)))
                if accepts(restriction, PortKind::Gate) =>
            {
                Ok(Field::Reference(Reference::direct(PortHandle::from(value))))
            }
            (FieldType::Reference(restriction), Field::Port(port)) if accepts(restriction, port.kind()) => {
                Ok(Field::Reference(Reference::direct(port)))
            }
            (FieldType::Reference(restriction), Field::Reference(reference))
                if reference.is_compatible(restriction) =>
            {
                Ok(Field::Reference(reference))
            }

            (_, other) => Err(mismatch(&other)),
        }
    }

    /// Fresh value for a slot the patch author does not supply
    pub(crate) fn allocate(declared: FieldType) -> Field {
        match declared {
            FieldType::Port(kind) => Field::Port(PortHandle::new(kind)),
            FieldType::Reference(restriction) => {
                Field::Port(PortHandle::new(restriction.unwrap_or(PortKind::Double)))
            }
            FieldType::Number => Field::Literal(Literal::Number(0.0)),
            FieldType::Text => Field::Literal(Literal::Text(String::new())),
            FieldType::Flag => Field::Literal(Literal::Flag(false)),
        }
    }
}

fn accepts(restriction: Option<PortKind>, kind: PortKind) -> bool {
    restriction.map_or(true, |required| required == kind)
}

impl From<Literal> for Field {
    fn from(literal: Literal) -> Self {
        Field::Literal(literal)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Literal(Literal::Number(value))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Field::Literal(Literal::Flag(value))
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Literal(Literal::Text(value.to_string()))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Literal(Literal::Text(value))
    }
}

impl From<Reference> for Field {
    fn from(reference: Reference) -> Self {
        Field::Reference(reference)
    }
}

impl From<PortHandle> for Field {
    fn from(port: PortHandle) -> Self {
        Field::Port(port)
    }
}

/// A module's fields, one slot per full-template field in template order
///
/// The slot layout is fixed by the template, so lookups go through the
/// template's index and type checks happen only when a slot is written.
#[derive(Debug, Clone)]
pub struct FieldTable {
    owner: String,
    template: Arc<Template>,
    slots: Vec<Field>,
}

impl FieldTable {
    pub(crate) fn new(owner: impl Into<String>, template: Arc<Template>, slots: Vec<Field>) -> Self {
        debug_assert_eq!(template.len(), slots.len());
        Self {
            owner: owner.into(),
            template,
            slots,
        }
    }

    pub(crate) fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    fn slot(&self, name: &str) -> Result<usize, PatchError> {
        self.template
            .position(name)
            .ok_or_else(|| PatchError::unknown_field(&self.owner, name))
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Result<&Field, PatchError> {
        let slot = self.slot(name)?;
        Ok(&self.slots[slot])
    }

    /// Replace a field, checking the new value against the template
    ///
    /// A reference replacing a narrowed reference inherits its restriction, and
    /// the new value is checked against that narrower type.
    pub fn set(&mut self, name: &str, value: Field) -> Result<(), PatchError> {
        let slot = self.slot(name)?;
        let inherited = self.slots[slot].as_reference().and_then(Reference::restriction);
        let declared = match self.template.fields()[slot].field_type {
            FieldType::Reference(restriction) => FieldType::Reference(inherited.or(restriction)),
            other => other,
        };
        let mut value = value.coerce(name, declared)?;

        if let Some(kind) = inherited {
            if let Field::Reference(reference) = &value {
                let narrowed = reference.narrowed(name, kind)?;
                value = Field::Reference(narrowed);
            }
        }

        self.slots[slot] = value;
        Ok(())
    }

    /// Get a numeric literal field
    pub fn number(&self, name: &str) -> Result<f64, PatchError> {
        let field = self.get(name)?;
        field
            .as_literal()
            .and_then(Literal::as_number)
            .ok_or_else(|| PatchError::mismatch(name, FieldType::Number, field.describe()))
    }

    /// Get a typed handle to an owned output port
    pub fn output<T: PortValue>(&self, name: &str) -> Result<Arc<Port<T>>, PatchError> {
        let field = self.get(name)?;
        field
            .as_port()
            .and_then(|port| port.typed::<T>())
            .ok_or_else(|| PatchError::mismatch(name, FieldType::Port(T::KIND), field.describe()))
    }

    /// Narrow the restriction of a reference field to `kind`
    pub fn narrow(&mut self, name: &str, kind: PortKind) -> Result<(), PatchError> {
        let slot = self.slot(name)?;
        let narrowed = match &self.slots[slot] {
            Field::Reference(reference) => reference.narrowed(name, kind)?,
            other => {
                return Err(PatchError::mismatch(
                    name,
                    FieldType::reference(kind),
                    other.describe(),
                ))
            }
        };
        self.slots[slot] = Field::Reference(narrowed);
        Ok(())
    }

    /// Iterate `(name, field)` pairs in template order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.template.names().zip(self.slots.iter())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
