//! Response shaping.
//!
//! Handlers may attach response descriptors declaring the serialization
//! format, status code, serialization context, and extra headers of the
//! outgoing response. The [`ResponseShaper`] applies those descriptors to a
//! finished response, or renders a handler's raw result value into a
//! response negotiated against the request's `Accept` header.
//!
//! Header directive values may contain `[(key)]` placeholders, substituted
//! from the request-scoped [`ResponseContext`]. Unknown keys are left
//! literal.

use crate::metadata::HandlerMetadata;
use crate::registry::TypeRegistry;
use crate::services::{SerializationContext, Serializer};
use crate::{Error, HttpRequest, HttpResponse, ServiceError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\((.*?)\)\]").unwrap()
});

/// One header to set on the shaped response. The value is a template,
/// expanded against the response context at shaping time.
#[derive(Debug, Clone)]
pub struct HeaderDirective {
    pub name: String,
    pub value: String,
}

impl HeaderDirective {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declarative description of how a handler's response should be shaped.
#[derive(Debug, Clone, Default)]
pub struct ResponseDescriptor {
    /// Registered type key naming the serialization format.
    pub type_key: Option<String>,
    /// Header directives, applied in declaration order.
    pub headers: Vec<HeaderDirective>,
    /// Serialization context passed to the serializer.
    pub context: SerializationContext,
    /// Status code override.
    pub code: Option<u16>,
}

impl ResponseDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, key: impl Into<String>) -> Self {
        self.type_key = Some(key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderDirective::new(name, value));
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }
}

/// Request-scoped key-value store backing header placeholder substitution.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    values: HashMap<String, String>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Expand every `[(key)]` placeholder in the template. Keys missing
    /// from the context are left as written.
    fn substitute(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures<'_>| {
                match self.values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Applies a handler's response descriptors to the outgoing response.
///
/// Request-scoped, like the resolver: one instance per request.
pub struct ResponseShaper {
    registry: Arc<TypeRegistry>,
    metadata: Arc<HandlerMetadata>,
    serializer: Option<Arc<dyn Serializer>>,
    context: ResponseContext,
}

impl ResponseShaper {
    pub fn new(registry: Arc<TypeRegistry>, metadata: Arc<HandlerMetadata>) -> Self {
        Self {
            registry,
            metadata,
            serializer: None,
            context: ResponseContext::new(),
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// The placeholder context, for handlers to publish values into.
    pub fn context_mut(&mut self) -> &mut ResponseContext {
        &mut self.context
    }

    /// Shape an already-built response in place.
    ///
    /// Header directives from every descriptor are applied in declaration
    /// order (later directives overwrite earlier ones for the same header
    /// name). The content type and status code come from the first
    /// descriptor only.
    pub fn shape(&self, response: &mut HttpResponse) -> Result<(), Error> {
        let descriptors = self.metadata.responses();
        let Some(first) = descriptors.first() else {
            return Ok(());
        };

        for descriptor in descriptors {
            for directive in &descriptor.headers {
                let value = self.context.substitute(&directive.value);
                response.headers.insert(directive.name.clone(), value);
            }
        }

        if let Some(key) = &first.type_key {
            let resolved = self.resolve_type_key(key)?;
            response
                .headers
                .insert("Content-Type".to_string(), resolved.value().to_string());
        }
        response.status = first.code.unwrap_or(200);
        Ok(())
    }

    /// Render a handler's raw result value into a full response.
    ///
    /// The serialization format comes from the first descriptor's type key
    /// when declared, otherwise from negotiating the request's accept
    /// header against the registered types.
    pub fn render(&self, request: &HttpRequest, result: &Value) -> Result<HttpResponse, Error> {
        let first = self.metadata.responses().first();
        let accept = match first.and_then(|d| d.type_key.as_ref()) {
            Some(key) => self.resolve_type_key(key)?,
            None => self.registry.resolve_accept_type(request),
        };
        let context = first.map(|d| d.context.clone()).unwrap_or_default();

        let body = match &self.serializer {
            Some(serializer) => match serializer.serialize(result, accept.name(), &context) {
                Ok(serialized) => serialized,
                Err(ServiceError::Http(err)) => return Err(err),
                Err(err) => return Err(Error::Serialization(err.to_string())),
            },
            // no serializer: pass text through, render anything else as JSON text
            None => match result {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };

        let mut response = HttpResponse::ok()
            .with_header("Content-Type".to_string(), accept.value().to_string())
            .with_body(body.into_bytes());
        self.shape(&mut response)?;
        Ok(response)
    }

    fn resolve_type_key(&self, key: &str) -> Result<crate::NegotiationResult, Error> {
        self.registry.get_type_from_key(key, 0).ok_or_else(|| {
            Error::Configuration(format!("response type \"{}\" cannot be resolved", key))
        })
    }
}
