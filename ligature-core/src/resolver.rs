//! Argument resolution.
//!
//! For each declared handler parameter, the [`ArgumentResolver`] inspects
//! the parameter's binding descriptor and the live request and produces the
//! bound value, applying default-value policy when the request carries no
//! relevant data.
//!
//! Resolution is one of exactly three strategies, chosen by the binding
//! variant: query-bound, body-field-bound, or raw-body-bound. Parameters
//! are independent of each other; the only state shared between them is the
//! per-request content-type memo, computed at most once.
//!
//! The resolver is request-scoped: one instance per request, never shared
//! across concurrent requests.

use crate::binding::{BodyFieldBinding, ParameterBinding, ParameterMetadata, QueryBinding, RawBodyBinding};
use crate::metadata::HandlerMetadata;
use crate::registry::TypeRegistry;
use crate::services::{
    Denormalizer, EntityLookupRegistry, SerializationContext, Serializer, Validator, Violation,
};
use crate::{Error, HttpRequest, NegotiationResult, ServiceError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request-scoped argument resolver.
pub struct ArgumentResolver {
    registry: Arc<TypeRegistry>,
    metadata: Arc<HandlerMetadata>,
    serializer: Option<Arc<dyn Serializer>>,
    denormalizer: Option<Arc<dyn Denormalizer>>,
    validator: Option<Arc<dyn Validator>>,
    lookups: Option<Arc<EntityLookupRegistry>>,
    /// Content type negotiated for this request, memoized on first need.
    content_type: Option<NegotiationResult>,
}

impl ArgumentResolver {
    pub fn new(registry: Arc<TypeRegistry>, metadata: Arc<HandlerMetadata>) -> Self {
        Self {
            registry,
            metadata,
            serializer: None,
            denormalizer: None,
            validator: None,
            lookups: None,
            content_type: None,
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_denormalizer(mut self, denormalizer: Arc<dyn Denormalizer>) -> Self {
        self.denormalizer = Some(denormalizer);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_lookups(mut self, lookups: Arc<EntityLookupRegistry>) -> Self {
        self.lookups = Some(lookups);
        self
    }

    /// Check whether this resolver can supply a value for the parameter.
    ///
    /// False when the handler declares no binding for the parameter's name
    /// (an "unsupported parameter", left for other resolvers), or when the
    /// binding is restricted to a route other than the one the request was
    /// matched to.
    pub fn supports(&self, request: &HttpRequest, param: &ParameterMetadata) -> bool {
        let Some(binding) = self.metadata.binding(&param.name) else {
            return false;
        };
        if let (Some(route), Some(current)) = (binding.route(), request.route_name()) {
            if route != current {
                return false;
            }
        }
        true
    }

    /// Resolve the bound value for one parameter.
    pub fn resolve(
        &mut self,
        request: &HttpRequest,
        param: &ParameterMetadata,
    ) -> Result<Value, Error> {
        let binding = self
            .metadata
            .binding(&param.name)
            .cloned()
            .ok_or_else(|| {
                Error::Internal(format!(
                    "no binding declared for parameter \"{}\"",
                    param.name
                ))
            })?;
        match binding {
            ParameterBinding::Query(b) => self.resolve_query(&b, param, request),
            ParameterBinding::BodyField(b) => self.resolve_body_field(&b, param, request),
            ParameterBinding::RawBody(b) => self.resolve_raw_body(&b, param, request),
        }
    }

    // ========== Default-value policy ==========

    /// The parameter's own declared default wins over the binding's; with
    /// neither, resolution fails naming the binding kind, target slot, and
    /// parameter.
    fn default_or_fail(
        &self,
        kind: &'static str,
        slot: &str,
        binding_default: Option<&Value>,
        param: &ParameterMetadata,
    ) -> Result<Value, Error> {
        if let Some(value) = &param.default_value {
            return Ok(value.clone());
        }
        if let Some(value) = binding_default {
            return Ok(value.clone());
        }
        Err(Error::UnresolvableParameter {
            kind,
            slot: slot.to_string(),
            parameter: param.name.clone(),
        })
    }

    /// Target type: the binding's declared type, else the parameter's own.
    fn resolve_type<'a>(
        declared: Option<&'a str>,
        param: &'a ParameterMetadata,
    ) -> Option<&'a str> {
        declared.or(param.type_name.as_deref())
    }

    // ========== Query strategy ==========

    fn resolve_query(
        &self,
        binding: &QueryBinding,
        param: &ParameterMetadata,
        request: &HttpRequest,
    ) -> Result<Value, Error> {
        let Some(raw) = request.query(&binding.name) else {
            return self.default_or_fail(
                "QueryBinding",
                &binding.bind_to,
                binding.default_value.as_ref(),
                param,
            );
        };
        if binding.repository.is_some() || binding.find_by.is_some() {
            return match self.lookup_entity(binding, param, raw) {
                Some(value) => Ok(value),
                None => self.default_or_fail(
                    "QueryBinding",
                    &binding.bind_to,
                    binding.default_value.as_ref(),
                    param,
                ),
            };
        }
        Ok(Value::String(raw.clone()))
    }

    /// Resolve the raw query value to an entity through the lookup service.
    /// Any failure (no registry, unknown manager, unresolved type, lookup
    /// error, empty result) reads as "not found".
    fn lookup_entity(
        &self,
        binding: &QueryBinding,
        param: &ParameterMetadata,
        raw: &str,
    ) -> Option<Value> {
        let lookups = self.lookups.as_ref()?;
        let entity_type = Self::resolve_type(binding.value_type.as_deref(), param)?;
        let service = match &binding.manager {
            Some(name) => match lookups.manager(name) {
                Ok(service) => service,
                Err(err) => {
                    tracing::debug!(slot = %binding.bind_to, error = %err, "entity lookup misconfigured");
                    return None;
                }
            },
            None => lookups.default_lookup()?,
        };

        let find_by = binding.find_by.clone().unwrap_or_else(|| binding.name.clone());
        let mut criteria = HashMap::new();
        criteria.insert(find_by, Value::String(raw.to_string()));

        if param.is_collection {
            match service.find_many(entity_type, &criteria) {
                Ok(rows) if !rows.is_empty() => Some(Value::Array(rows)),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(slot = %binding.bind_to, error = %err, "entity lookup failed");
                    None
                }
            }
        } else {
            match service.find_one(entity_type, &criteria) {
                Ok(found) => found,
                Err(err) => {
                    tracing::debug!(slot = %binding.bind_to, error = %err, "entity lookup failed");
                    None
                }
            }
        }
    }

    // ========== Body-field strategy ==========

    fn resolve_body_field(
        &self,
        binding: &BodyFieldBinding,
        param: &ParameterMetadata,
        request: &HttpRequest,
    ) -> Result<Value, Error> {
        if let Some(name) = &binding.name {
            return match request.form(name) {
                Some(value) => Ok(value.clone()),
                None => self.default_or_fail(
                    "BodyFieldBinding",
                    &binding.bind_to,
                    binding.default_value.as_ref(),
                    param,
                ),
            };
        }

        // No field name: bind the entire payload.
        if request.form_params.is_empty() {
            return self.default_or_fail(
                "BodyFieldBinding",
                &binding.bind_to,
                binding.default_value.as_ref(),
                param,
            );
        }
        let Some(target_type) = Self::resolve_type(binding.value_type.as_deref(), param) else {
            // No resolvable type: hand back the collection unmodified.
            return Ok(Value::Object(
                request
                    .form_params
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ));
        };
        if let Some(denormalizer) = &self.denormalizer {
            if self.registry.is_normalizer_enabled()
                && denormalizer.supports_denormalization(&request.form_params, target_type)
            {
                match denormalizer.denormalize(&request.form_params, target_type) {
                    Ok(value) if !is_empty_value(&value) => return Ok(value),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(slot = %binding.bind_to, error = %err, "denormalization failed");
                    }
                }
            }
        }
        self.default_or_fail(
            "BodyFieldBinding",
            &binding.bind_to,
            binding.default_value.as_ref(),
            param,
        )
    }

    // ========== Raw-body strategy ==========

    /// Content type for body deserialization, negotiated at most once per
    /// request. A declared format key on the binding bypasses negotiation
    /// entirely; an unknown key is a hard configuration error.
    fn negotiated_content_type(
        &mut self,
        binding: &RawBodyBinding,
        request: &HttpRequest,
    ) -> Result<NegotiationResult, Error> {
        if let Some(cached) = &self.content_type {
            return Ok(cached.clone());
        }
        let resolved = match &binding.format {
            Some(format) => self.registry.get_type_from_key(format, 0).ok_or_else(|| {
                Error::Configuration(format!("content type \"{}\" cannot be resolved", format))
            })?,
            None => self.registry.resolve_content_type(request),
        };
        self.content_type = Some(resolved.clone());
        Ok(resolved)
    }

    fn resolve_raw_body(
        &mut self,
        binding: &RawBodyBinding,
        param: &ParameterMetadata,
        request: &HttpRequest,
    ) -> Result<Value, Error> {
        if request.body.is_empty() {
            return self.default_or_fail(
                "RawBodyBinding",
                &binding.bind_to,
                binding.default_value.as_ref(),
                param,
            );
        }

        let target_type = match Self::resolve_type(binding.value_type.as_deref(), param) {
            Some(target) => target.to_string(),
            // No resolvable type: the raw content itself is the value.
            None => return Ok(raw_body_value(request)),
        };
        let serializer = match &self.serializer {
            Some(serializer) if self.registry.is_serializer_enabled() => Arc::clone(serializer),
            _ => return Ok(raw_body_value(request)),
        };

        let content_type = self.negotiated_content_type(binding, request)?;
        let value = match serializer.deserialize(
            &request.body,
            &target_type,
            content_type.name(),
            &SerializationContext::new(),
        ) {
            Ok(value) => value,
            Err(ServiceError::Http(err)) => return Err(err),
            Err(err) => {
                tracing::debug!(slot = %binding.bind_to, error = %err, "body deserialization failed");
                return self.default_or_fail(
                    "RawBodyBinding",
                    &binding.bind_to,
                    binding.default_value.as_ref(),
                    param,
                );
            }
        };
        if is_empty_value(&value) {
            return self.default_or_fail(
                "RawBodyBinding",
                &binding.bind_to,
                binding.default_value.as_ref(),
                param,
            );
        }

        if binding.validate && self.registry.is_validator_enabled() {
            if let Some(validator) = &self.validator {
                let violations = validator.validate(&value);
                if !violations.is_empty() {
                    return Err(Error::BadRequest(format!(
                        "Invalid request body. {}",
                        aggregate_violations(&violations)
                    )));
                }
            }
        }
        Ok(value)
    }
}

/// The raw body as a value: UTF-8 text.
fn raw_body_value(request: &HttpRequest) -> Value {
    Value::String(String::from_utf8_lossy(&request.body).into_owned())
}

/// Empty or falsy deserialization results fall through to default policy.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// One aggregated message covering every violation: message, constraint
/// parameters, and property path per entry.
fn aggregate_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{},{}--{}", v.message, v.parameters.join(","), v.property_path))
        .collect::<Vec<_>>()
        .join(",")
}
