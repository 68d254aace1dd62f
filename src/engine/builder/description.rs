use crate::engine::components::factory::Args;
use crate::engine::components::fields::Field;
use crate::engine::components::registry::Registry;
use crate::engine::error::PatchError;
use crate::engine::execution::config::EngineConfig;
use crate::engine::execution::patch::Patch;
use crate::engine::types::PortKind;
use crate::engine::values::reference::Reference;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value supplied for one field in a patch description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Number(f64),
    Flag(bool),
    Text(String),
    /// Output of another instance, resolved when the patch is bound
    Ref {
        module: String,
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<PortKind>,
    },
}

impl ArgValue {
    /// Reference to `module.field`
    pub fn reference(module: impl Into<String>, field: impl Into<String>) -> Self {
        ArgValue::Ref {
            module: module.into(),
            field: field.into(),
            kind: None,
        }
    }
}

impl From<ArgValue> for Field {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Number(value) => Field::from(value),
            ArgValue::Flag(value) => Field::from(value),
            ArgValue::Text(value) => Field::from(value),
            ArgValue::Ref { module, field, kind } => {
                let reference = Reference::to_field(module, field);
                Field::from(match kind {
                    Some(kind) => reference.restricted(kind),
                    None => reference,
                })
            }
        }
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Flag(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

/// One module instance in a patch description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEntry {
    /// Instance name
    pub name: String,
    /// Registered kind name
    pub kind: String,
    #[serde(default)]
    pub fields: BTreeMap<String, ArgValue>,
}

/// Declarative patch: which modules exist and what their fields hold
///
/// This is the parsed form only. Building it constructs every module through
/// the registry; binding is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchDescription {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub modules: Vec<PatchEntry>,
}

impl PatchDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance
    pub fn module<I, S, V>(mut self, name: &str, kind: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<ArgValue>,
    {
        self.modules.push(PatchEntry {
            name: name.to_string(),
            kind: kind.to_string(),
            fields: fields
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        });
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Construct every described module into an unbound patch
    pub fn build(&self, registry: &Registry) -> Result<Patch, PatchError> {
        self.build_with_config(registry, self.config.clone())
    }

    /// Same as `build`, overriding the described engine configuration
    pub fn build_with_config(&self, registry: &Registry, config: EngineConfig) -> Result<Patch, PatchError> {
        let mut patch = Patch::with_config(config)?;
        for entry in &self.modules {
            let args: Args = entry
                .fields
                .iter()
                .map(|(field, value)| (field.as_str(), Field::from(value.clone())))
                .collect();
            let module = registry.construct_named(&entry.name, &entry.kind, args)?;
            patch.insert(module)?;
        }
        info!("Built patch with {} modules", patch.len());
        Ok(patch)
    }
}
