use crate::engine::error::PatchError;
use crate::engine::types::FieldType;
use std::collections::HashMap;

/// One named, typed slot of a template
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Type an argument must satisfy
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Immutable ordered schema of a module kind's fields
///
/// Templates are built once per kind and shared. `extend` derives a new
/// template and leaves `self` untouched.
#[derive(Debug, Clone, Default)]
pub struct Template {
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl Template {
    /// Build a template from ordered `(name, type)` pairs
    pub fn build<I, S>(fields: I) -> Result<Self, PatchError>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        Self::default().extend(fields)
    }

    /// Template with no fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derive a template with `more` appended after the existing fields
    pub fn extend<I, S>(&self, more: I) -> Result<Template, PatchError>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut derived = self.clone();
        for (name, field_type) in more {
            let name = name.into();
            if derived.index.contains_key(&name) {
                return Err(PatchError::DuplicateField(name));
            }
            derived.index.insert(name.clone(), derived.fields.len());
            derived.fields.push(FieldSpec::new(name, field_type));
        }
        Ok(derived)
    }

    /// Get the required type of a field
    pub fn lookup(&self, name: &str) -> Option<FieldType> {
        self.index.get(name).map(|&slot| self.fields[slot].field_type)
    }

    /// Get the slot position of a field
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `self` starts with exactly the fields of `base`
    pub fn is_extension_of(&self, base: &Template) -> bool {
        self.fields.len() >= base.fields.len() && self.fields[..base.fields.len()] == base.fields[..]
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}
