use crate::engine::components::fields::{Field, FieldTable};
use crate::engine::components::module::{Constructor, Module};
use crate::engine::components::template::Template;
use crate::engine::error::PatchError;
use crate::engine::types::FieldType;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction arguments: field name -> literal or reference
///
/// Kept sorted so validation reports the same offending field every time.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: BTreeMap<String, Field>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Field>) -> Option<Field> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>, V: Into<Field>> FromIterator<(S, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// Validator and constructor for one module kind
///
/// The base template lists what a patch author may supply; the full template
/// appends the kind's own outputs and internal fields.
pub struct Factory {
    name: String,
    base: Arc<Template>,
    full: Arc<Template>,
    constructor: Constructor,
}

impl Factory {
    /// Create a factory whose full template is `base` followed by `own_fields`
    ///
    /// # Arguments
    /// * `name` - Kind name the factory is registered under
    /// * `base` - Fields a patch author supplies
    /// * `own_fields` - Outputs and internal fields allocated at construction
    /// * `constructor` - Narrows inputs and builds the kind's behaviour
    ///
    /// # Returns
    /// The factory, or `DuplicateField` if `own_fields` repeats a base name
    pub fn new<I, S>(
        name: &str,
        base: Template,
        own_fields: I,
        constructor: Constructor,
    ) -> Result<Self, PatchError>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let full = base.extend(own_fields)?;
        Ok(Self {
            name: name.to_string(),
            base: Arc::new(base),
            full: Arc::new(full),
            constructor,
        })
    }

    /// Get the short kind name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_template(&self) -> &Arc<Template> {
        &self.base
    }

    pub fn full_template(&self) -> &Arc<Template> {
        &self.full
    }

    /// Check `args` against the base template and return the coerced base slots
    pub fn validate(&self, mut args: Args) -> Result<Vec<Field>, PatchError> {
        if let Some(unknown) = args.names().find(|name| !self.base.contains(name)) {
            return Err(PatchError::unknown_field(&self.name, unknown));
        }

        let mut slots = Vec::with_capacity(self.full.len());
        for spec in self.base.fields() {
            let value = args.remove(&spec.name).ok_or_else(|| PatchError::MissingField {
                owner: self.name.clone(),
                field: spec.name.clone(),
            })?;
            slots.push(value.coerce(&spec.name, spec.field_type)?);
        }
        Ok(slots)
    }

    /// Validate `args`, lay out the field table, and run the kind constructor
    pub fn construct(&self, args: Args) -> Result<Module, PatchError> {
        let mut slots = self.validate(args)?;
        for spec in &self.full.fields()[self.base.len()..] {
            slots.push(Field::allocate(spec.field_type));
        }

        let mut fields = FieldTable::new(self.name.clone(), Arc::clone(&self.full), slots);
        let behavior = (self.constructor)(self, &mut fields)?;

        debug!("Constructed '{}' module with {} fields", self.name, fields.len());
        Ok(Module::new(&self.name, fields, behavior))
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("full", &self.full)
            .finish()
    }
}
