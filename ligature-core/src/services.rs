//! Pluggable collaborator contracts.
//!
//! The binding core delegates serialization, denormalization, validation,
//! and entity lookup to narrow service seams. All seams are synchronous and
//! `Send + Sync`; implementations own any blocking they perform.

use crate::ServiceError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Arbitrary key-value context passed through serialization calls.
pub type SerializationContext = HashMap<String, Value>;

// ============================================================================
// Serializer
// ============================================================================

/// Converts values to and from a named wire format.
pub trait Serializer: Send + Sync {
    /// Serialize a value into the named format.
    fn serialize(
        &self,
        value: &Value,
        format: &str,
        context: &SerializationContext,
    ) -> Result<String, ServiceError>;

    /// Deserialize raw bytes into a value of the named target type.
    fn deserialize(
        &self,
        raw: &[u8],
        target_type: &str,
        format: &str,
        context: &SerializationContext,
    ) -> Result<Value, ServiceError>;
}

/// Serializer backed by `serde_json`. Handles the `json` format only;
/// other formats are reported as plain failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn serialize(
        &self,
        value: &Value,
        format: &str,
        _context: &SerializationContext,
    ) -> Result<String, ServiceError> {
        if format != "json" {
            return Err(ServiceError::failure(format!(
                "unsupported serialization format \"{}\"",
                format
            )));
        }
        serde_json::to_string(value).map_err(|e| ServiceError::failure(e.to_string()))
    }

    fn deserialize(
        &self,
        raw: &[u8],
        _target_type: &str,
        format: &str,
        _context: &SerializationContext,
    ) -> Result<Value, ServiceError> {
        if format != "json" {
            return Err(ServiceError::failure(format!(
                "unsupported deserialization format \"{}\"",
                format
            )));
        }
        serde_json::from_slice(raw).map_err(|e| ServiceError::failure(e.to_string()))
    }
}

// ============================================================================
// Denormalizer
// ============================================================================

/// Converts a generic structured payload into a strongly-typed object.
pub trait Denormalizer: Send + Sync {
    /// Whether this service can denormalize the given data/type pair.
    fn supports_denormalization(&self, data: &HashMap<String, Value>, target_type: &str) -> bool;

    /// Denormalize the payload into the target type.
    fn denormalize(
        &self,
        data: &HashMap<String, Value>,
        target_type: &str,
    ) -> Result<Value, ServiceError>;
}

/// Denormalizer that lifts the field map into a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapDenormalizer;

impl MapDenormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Denormalizer for MapDenormalizer {
    fn supports_denormalization(&self, _data: &HashMap<String, Value>, target_type: &str) -> bool {
        !target_type.is_empty()
    }

    fn denormalize(
        &self,
        data: &HashMap<String, Value>,
        _target_type: &str,
    ) -> Result<Value, ServiceError> {
        Ok(Value::Object(
            data.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ))
    }
}

// ============================================================================
// Validator
// ============================================================================

/// One constraint violation reported by a validator.
#[derive(Debug, Clone)]
pub struct Violation {
    pub message: String,
    pub parameters: Vec<String>,
    pub property_path: String,
}

impl Violation {
    pub fn new(message: impl Into<String>, property_path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameters: Vec::new(),
            property_path: property_path.into(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }
}

/// Validates a deserialized value, returning all violations found.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value) -> Vec<Violation>;
}

// ============================================================================
// Entity lookup
// ============================================================================

/// Key-value entity lookup against a named entity type.
pub trait EntityLookup: Send + Sync {
    /// Find a single entity matching all criteria.
    fn find_one(
        &self,
        entity_type: &str,
        criteria: &HashMap<String, Value>,
    ) -> Result<Option<Value>, ServiceError>;

    /// Find all entities matching all criteria.
    fn find_many(
        &self,
        entity_type: &str,
        criteria: &HashMap<String, Value>,
    ) -> Result<Vec<Value>, ServiceError>;
}

/// Registry of lookup services: one default plus optional named managers.
#[derive(Clone, Default)]
pub struct EntityLookupRegistry {
    default: Option<Arc<dyn EntityLookup>>,
    managers: HashMap<String, Arc<dyn EntityLookup>>,
}

impl EntityLookupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.default = Some(lookup);
        self
    }

    pub fn with_manager(mut self, name: impl Into<String>, lookup: Arc<dyn EntityLookup>) -> Self {
        self.managers.insert(name.into(), lookup);
        self
    }

    /// The default lookup service, if one is configured.
    pub fn default_lookup(&self) -> Option<&Arc<dyn EntityLookup>> {
        self.default.as_ref()
    }

    /// A named lookup service; unknown names are a misconfiguration.
    pub fn manager(&self, name: &str) -> Result<&Arc<dyn EntityLookup>, ServiceError> {
        self.managers
            .get(name)
            .ok_or_else(|| ServiceError::failure(format!("unknown lookup manager \"{}\"", name)))
    }
}

/// In-memory entity lookup keyed by entity type name. Matches entities by
/// field equality against every criterion.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityLookup {
    entities: HashMap<String, Vec<Value>>,
}

impl InMemoryEntityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entity_type: impl Into<String>, rows: Vec<Value>) -> Self {
        self.entities.insert(entity_type.into(), rows);
        self
    }

    fn matches(entity: &Value, criteria: &HashMap<String, Value>) -> bool {
        criteria
            .iter()
            .all(|(field, expected)| entity.get(field) == Some(expected))
    }
}

impl EntityLookup for InMemoryEntityLookup {
    fn find_one(
        &self,
        entity_type: &str,
        criteria: &HashMap<String, Value>,
    ) -> Result<Option<Value>, ServiceError> {
        let rows = self
            .entities
            .get(entity_type)
            .ok_or_else(|| ServiceError::failure(format!("unknown entity type \"{}\"", entity_type)))?;
        Ok(rows.iter().find(|e| Self::matches(e, criteria)).cloned())
    }

    fn find_many(
        &self,
        entity_type: &str,
        criteria: &HashMap<String, Value>,
    ) -> Result<Vec<Value>, ServiceError> {
        let rows = self
            .entities
            .get(entity_type)
            .ok_or_else(|| ServiceError::failure(format!("unknown entity type \"{}\"", entity_type)))?;
        Ok(rows
            .iter()
            .filter(|e| Self::matches(e, criteria))
            .cloned()
            .collect())
    }
}
