use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use super::error::ResolveError;

pub const APPLICATION_REPO_URL: &str = "https://charts.getporter.dev";
pub const ADDON_REPO_URL: &str = "https://chart-addons.getporter.dev";

pub const DEFAULT_VERSION: &str = "latest";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Values returned by the template service for a chart.
pub type SourceValues = serde_json::Map<String, serde_json::Value>;

/// A deployable template, located in a repository where it is known to exist.
#[derive(Debug, Clone, PartialEq, serde_derive::Serialize)]
pub struct Source {
    pub name: String,
    pub repo: String,
    pub version: String,
    pub is_application: bool,
    pub source_values: SourceValues,
}

/// Where a resource gets deployed.
#[derive(Debug, Clone, PartialEq, Eq, serde_derive::Serialize)]
pub struct Target {
    pub app_name: Option<String>,
    pub project: u64,
    pub cluster: u64,
    pub namespace: String,
}

/// Project and cluster used when neither the environment nor the document set one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetDefaults {
    pub project: u64,
    pub cluster: u64,
}

/// Typed view of a `source` block. Keys are decoded on access, so a key
/// whose environment override is set is never type-checked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceInput<'a> {
    mapping: Option<&'a Mapping>,
}

impl<'a> SourceInput<'a> {
    pub fn from_document(document: &'a Value) -> Result<Self, ResolveError> {
        Ok(Self {
            mapping: as_mapping(document, "source")?,
        })
    }

    pub fn name(&self) -> Result<Option<String>, ResolveError> {
        string_field(self.mapping, "name")
    }

    pub fn repo(&self) -> Result<Option<String>, ResolveError> {
        string_field(self.mapping, "repo")
    }

    pub fn version(&self) -> Result<Option<String>, ResolveError> {
        string_field(self.mapping, "version")
    }
}

/// Typed view of a `target` block, decoded on access like [`SourceInput`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetInput<'a> {
    mapping: Option<&'a Mapping>,
}

impl<'a> TargetInput<'a> {
    pub fn from_document(document: &'a Value) -> Result<Self, ResolveError> {
        Ok(Self {
            mapping: as_mapping(document, "target")?,
        })
    }

    pub fn app_name(&self) -> Result<Option<String>, ResolveError> {
        string_field(self.mapping, "app_name")
    }

    pub fn namespace(&self) -> Result<Option<String>, ResolveError> {
        string_field(self.mapping, "namespace")
    }

    /// Zero counts as unset.
    pub fn project(&self) -> Result<Option<u64>, ResolveError> {
        id_field(self.mapping, "project")
    }

    /// Zero counts as unset.
    pub fn cluster(&self) -> Result<Option<u64>, ResolveError> {
        id_field(self.mapping, "cluster")
    }
}

fn as_mapping<'a>(
    document: &'a Value,
    block: &str,
) -> Result<Option<&'a Mapping>, ResolveError> {
    match document {
        Value::Null => Ok(None),
        Value::Mapping(mapping) => Ok(Some(mapping)),
        other => Err(ResolveError::InvalidField {
            field: block.to_string(),
            reason: format!("expected a mapping, found {}", kind(other)),
        }),
    }
}

fn string_field(mapping: Option<&Mapping>, key: &str) -> Result<Option<String>, ResolveError> {
    Ok(field::<String>(mapping, key)?.filter(|v| !v.is_empty()))
}

fn id_field(mapping: Option<&Mapping>, key: &str) -> Result<Option<u64>, ResolveError> {
    Ok(field::<u64>(mapping, key)?.filter(|id| *id != 0))
}

fn field<T: DeserializeOwned>(
    mapping: Option<&Mapping>,
    key: &str,
) -> Result<Option<T>, ResolveError> {
    match mapping.and_then(|mapping| mapping.get(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|e| ResolveError::InvalidField {
                field: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
