//! Discovery document decoding
//!
//! The discovery endpoint serves OpenAPI v2 definitions in their protobuf JSON
//! shape, where every map is flattened into an `additional_properties` list of
//! `{name, value}` pairs:
//!
//! ```json
//! {
//!   "swagger": "2.0",
//!   "definitions": {
//!     "additional_properties": [
//!       {
//!         "name": "io.k8s.api.core.v1.Pod",
//!         "value": {
//!           "description": "...",
//!           "type": { "value": ["object"] },
//!           "properties": { "additional_properties": [ { "name": "spec", "value": { "_ref": "#/definitions/io.k8s.api.core.v1.PodSpec" } } ] }
//!         }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! [`DefinitionIndex`] keeps definitions in document order and maps each
//! fully-qualified name to its entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{ForestError, Result};

/// Prefix carried by every local definition reference
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Definition name a `$ref` points at
///
/// `#/definitions/io.k8s.api.core.v1.PodSpec` -> `io.k8s.api.core.v1.PodSpec`
pub fn ref_target(reference: &str) -> &str {
    match reference.strip_prefix(DEFINITIONS_PREFIX) {
        Some(name) => name,
        None => reference.rsplit('/').next().unwrap_or(reference),
    }
}

/// Top level of the discovery document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(default)]
    pub swagger: String,
    #[serde(default)]
    pub definitions: DefinitionList,
}

/// Definitions are decoded one by one so a single bad entry cannot sink the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionList {
    #[serde(default)]
    pub additional_properties: Vec<serde_json::Value>,
}

/// One named schema entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(default)]
    pub value: DefinitionBody,
}

impl Definition {
    /// First declared JSON type, or empty
    pub fn type_name(&self) -> &str {
        self.value.type_set.first()
    }

    pub fn description(&self) -> &str {
        &self.value.description
    }

    pub fn properties(&self) -> &[Property] {
        &self.value.properties.additional_properties
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionBody {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: PropertyList,
    #[serde(default, rename = "type")]
    pub type_set: TypeSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyList {
    #[serde(default)]
    pub additional_properties: Vec<Property>,
}

/// A named property of a definition or of an inline object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: PropertySchema,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub type_set: Option<TypeSet>,
    #[serde(default, rename = "_ref")]
    pub reference: String,
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<EnumValue>,
    #[serde(default)]
    pub items: Items,
    #[serde(default)]
    pub properties: PropertyList,
}

impl PropertySchema {
    pub fn type_name(&self) -> &str {
        self.type_set.as_ref().map(TypeSet::first).unwrap_or("")
    }
}

/// Declared JSON types, of which only the first is used
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSet {
    #[serde(default)]
    pub value: Vec<String>,
}

impl TypeSet {
    pub fn first(&self) -> &str {
        self.value.first().map(String::as_str).unwrap_or("")
    }
}

/// One allowed literal, serialized as YAML text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub yaml: String,
}

/// Array element schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Items {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<SchemaRef>,
}

impl Items {
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Element `$ref`, when the first element schema carries one
    pub fn reference(&self) -> Option<&str> {
        self.schema
            .first()
            .map(|s| s.reference.as_str())
            .filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    #[serde(default, rename = "_ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

/// A definition that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDefinition {
    pub name: Option<String>,
    pub reason: String,
}

/// Name -> definition mapping, in document order
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    definitions: Vec<Definition>,
    by_name: HashMap<String, usize>,
    skipped: Vec<SkippedDefinition>,
}

impl DefinitionIndex {
    /// Decode a raw document, skipping malformed definitions
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with(raw, false)
    }

    /// Decode a raw document; in strict mode a malformed definition is an error
    pub fn parse_with(raw: &[u8], strict: bool) -> Result<Self> {
        let document: DiscoveryDocument =
            serde_json::from_slice(raw).map_err(ForestError::Decode)?;
        Self::from_document(document, strict)
    }

    /// Index an already decoded JSON value
    pub fn from_value(value: serde_json::Value, strict: bool) -> Result<Self> {
        let document: DiscoveryDocument =
            serde_json::from_value(value).map_err(ForestError::Decode)?;
        Self::from_document(document, strict)
    }

    pub fn from_document(document: DiscoveryDocument, strict: bool) -> Result<Self> {
        let entries = document.definitions.additional_properties;
        let mut index = Self {
            definitions: Vec::with_capacity(entries.len()),
            by_name: HashMap::with_capacity(entries.len()),
            skipped: Vec::new(),
        };

        for entry in entries {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .map(String::from);

            let decoded = serde_json::from_value::<Definition>(entry)
                .map_err(|e| e.to_string())
                .and_then(|def| {
                    if def.name.is_empty() {
                        Err("definition has no name".to_string())
                    } else {
                        Ok(def)
                    }
                });

            match decoded {
                Ok(def) => index.insert(def),
                Err(reason) if strict => {
                    return Err(ForestError::InvalidDefinition {
                        name: name.unwrap_or_default(),
                        reason,
                    });
                }
                Err(reason) => {
                    warn!(
                        name = name.as_deref().unwrap_or("<unnamed>"),
                        %reason,
                        "skipping malformed definition"
                    );
                    index.skipped.push(SkippedDefinition { name, reason });
                }
            }
        }

        debug!(
            definitions = index.definitions.len(),
            skipped = index.skipped.len(),
            "indexed discovery document"
        );
        Ok(index)
    }

    /// Build an index from definitions directly
    pub fn from_definitions(definitions: impl IntoIterator<Item = Definition>) -> Self {
        let mut index = Self::default();
        for def in definitions {
            index.insert(def);
        }
        index
    }

    // A repeated name keeps both entries in order; lookups see the last one.
    fn insert(&mut self, def: Definition) {
        self.by_name.insert(def.name.clone(), self.definitions.len());
        self.definitions.push(def);
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.by_name.get(name).map(|&i| &self.definitions[i])
    }

    /// Look up the definition a `$ref` points at
    pub fn resolve(&self, reference: &str) -> Option<&Definition> {
        self.get(ref_target(reference))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Definitions in document order
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedDefinition] {
        &self.skipped
    }
}
