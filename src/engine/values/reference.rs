use crate::engine::connections::resolver::Resolve;
use crate::engine::error::PatchError;
use crate::engine::types::{FieldRef, FieldType, PortKind};
use crate::engine::values::port::PortHandle;

/// Where a reference points
#[derive(Debug, Clone)]
pub enum Target {
    /// Output field of another instance, looked up at bind time
    Field(FieldRef),
    /// Concrete port, already resolved
    Direct(PortHandle),
}

/// Typed, possibly unresolved pointer to a value source
///
/// The restriction starts out optional and may be tightened once. Narrowing
/// returns a new reference; the field table swaps it in whole.
#[derive(Debug, Clone)]
pub struct Reference {
    restriction: Option<PortKind>,
    target: Target,
}

impl Reference {
    /// Reference to `module.field`, resolved at bind time
    pub fn to_field(module: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            restriction: None,
            target: Target::Field(FieldRef::new(module, field)),
        }
    }

    /// Reference that already points at a port
    pub fn direct(port: PortHandle) -> Self {
        Self {
            restriction: None,
            target: Target::Direct(port),
        }
    }

    /// Restrict the reference up front; conflicts are reported when narrowed later
    pub fn restricted(mut self, kind: PortKind) -> Self {
        self.restriction = Some(kind);
        self
    }

    pub fn restriction(&self) -> Option<PortKind> {
        self.restriction
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Field name targeted by this reference, if it is not direct
    pub fn field_ref(&self) -> Option<&FieldRef> {
        match &self.target {
            Target::Field(target) => Some(target),
            Target::Direct(_) => None,
        }
    }

    /// Whether this reference can stand where `required` is expected
    pub fn is_compatible(&self, required: Option<PortKind>) -> bool {
        match (self.restriction, required) {
            (Some(have), Some(want)) => have == want,
            _ => true,
        }
    }

    /// Tighten the restriction to `kind`
    pub fn narrowed(&self, field: &str, kind: PortKind) -> Result<Reference, PatchError> {
        match self.restriction {
            Some(existing) if existing != kind => Err(PatchError::mismatch(
                field,
                FieldType::reference(kind),
                FieldType::reference(existing),
            )),
            _ => Ok(Reference {
                restriction: Some(kind),
                target: self.target.clone(),
            }),
        }
    }

    /// Resolve to a concrete port on behalf of `module.field`
    pub fn resolve(
        &self,
        module: &str,
        field: &str,
        resolver: &dyn Resolve,
    ) -> Result<PortHandle, PatchError> {
        let handle = match &self.target {
            Target::Field(target) => resolver.resolve(module, target)?,
            Target::Direct(port) => port.clone(),
        };

        if let Some(kind) = self.restriction {
            if handle.kind() != kind {
                return Err(PatchError::mismatch(
                    field,
                    FieldType::reference(kind),
                    FieldType::Port(handle.kind()),
                ));
            }
        }

        Ok(handle)
    }
}
