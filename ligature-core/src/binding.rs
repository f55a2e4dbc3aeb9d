//! Parameter binding descriptors.
//!
//! A binding is a declarative rule mapping a handler parameter to a source
//! of request data. Bindings are declared at handler registration time and
//! dispatched as a tagged union by the
//! [`ArgumentResolver`](crate::ArgumentResolver).
//!
//! # Examples
//!
//! ```
//! use ligature_core::binding::{ParameterBinding, QueryBinding, RawBodyBinding};
//! use serde_json::json;
//!
//! let id = QueryBinding::new("user")
//!     .with_repository("users")
//!     .with_find_by("id");
//!
//! let payload = RawBodyBinding::new("payload")
//!     .with_type("CreateUser")
//!     .with_validation()
//!     .with_default(json!(null));
//!
//! let bindings: Vec<ParameterBinding> = vec![id.into(), payload.into()];
//! assert_eq!(bindings[0].bind_to(), "user");
//! ```

use serde_json::Value;

/// Query-bound parameter: reads a named value from the query-parameter
/// source, optionally resolving it to an entity through a lookup service.
#[derive(Debug, Clone)]
pub struct QueryBinding {
    /// Target slot the resolved value binds to.
    pub bind_to: String,
    /// Query parameter to read; defaults to `bind_to`.
    pub name: String,
    /// Entity repository hint; presence turns the raw value into a lookup key.
    pub repository: Option<String>,
    /// Lookup field; defaults to `name` when a lookup is performed.
    pub find_by: Option<String>,
    /// Named lookup service to use instead of the default one.
    pub manager: Option<String>,
    /// Declared value type; falls back to the parameter's own declared type.
    pub value_type: Option<String>,
    /// Declared default value. `Some(Value::Null)` is an explicit null default.
    pub default_value: Option<Value>,
    /// Restricts the binding to a single named route.
    pub route: Option<String>,
}

impl QueryBinding {
    pub fn new(bind_to: impl Into<String>) -> Self {
        let bind_to = bind_to.into();
        Self {
            name: bind_to.clone(),
            bind_to,
            repository: None,
            find_by: None,
            manager: None,
            value_type: None,
            default_value: None,
            route: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_find_by(mut self, find_by: impl Into<String>) -> Self {
        self.find_by = Some(find_by.into());
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

/// Body-field-bound parameter: reads one field from the structured
/// body-parameter source, or the entire payload when no field is named.
#[derive(Debug, Clone)]
pub struct BodyFieldBinding {
    pub bind_to: String,
    /// Field to read; `None` binds the entire payload (possibly denormalized).
    pub name: Option<String>,
    pub value_type: Option<String>,
    pub default_value: Option<Value>,
    pub route: Option<String>,
}

impl BodyFieldBinding {
    pub fn new(bind_to: impl Into<String>) -> Self {
        Self {
            bind_to: bind_to.into(),
            name: None,
            value_type: None,
            default_value: None,
            route: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

/// Raw-body-bound parameter: reads the full request body, optionally
/// deserializing and validating it.
#[derive(Debug, Clone)]
pub struct RawBodyBinding {
    pub bind_to: String,
    /// Declared format key (e.g. "json"); overrides content negotiation.
    pub format: Option<String>,
    /// Validate the deserialized value through the configured validator.
    pub validate: bool,
    pub value_type: Option<String>,
    pub default_value: Option<Value>,
    pub route: Option<String>,
}

impl RawBodyBinding {
    pub fn new(bind_to: impl Into<String>) -> Self {
        Self {
            bind_to: bind_to.into(),
            format: None,
            validate: false,
            value_type: None,
            default_value: None,
            route: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_validation(mut self) -> Self {
        self.validate = true;
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

/// A declarative rule mapping one handler parameter to a request data source.
#[derive(Debug, Clone)]
pub enum ParameterBinding {
    Query(QueryBinding),
    BodyField(BodyFieldBinding),
    RawBody(RawBodyBinding),
}

impl ParameterBinding {
    /// Target slot identifier the resolved value binds to.
    pub fn bind_to(&self) -> &str {
        match self {
            ParameterBinding::Query(b) => &b.bind_to,
            ParameterBinding::BodyField(b) => &b.bind_to,
            ParameterBinding::RawBody(b) => &b.bind_to,
        }
    }

    /// Route-name restriction, if any.
    pub fn route(&self) -> Option<&str> {
        match self {
            ParameterBinding::Query(b) => b.route.as_deref(),
            ParameterBinding::BodyField(b) => b.route.as_deref(),
            ParameterBinding::RawBody(b) => b.route.as_deref(),
        }
    }

    /// Declared value type, if any.
    pub fn value_type(&self) -> Option<&str> {
        match self {
            ParameterBinding::Query(b) => b.value_type.as_deref(),
            ParameterBinding::BodyField(b) => b.value_type.as_deref(),
            ParameterBinding::RawBody(b) => b.value_type.as_deref(),
        }
    }

    /// Declared default value, if any.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            ParameterBinding::Query(b) => b.default_value.as_ref(),
            ParameterBinding::BodyField(b) => b.default_value.as_ref(),
            ParameterBinding::RawBody(b) => b.default_value.as_ref(),
        }
    }

    /// Whether a default was declared, including an explicit null default.
    pub fn has_default(&self) -> bool {
        self.default_value().is_some()
    }

    /// Binding kind name, used in resolution error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterBinding::Query(_) => "QueryBinding",
            ParameterBinding::BodyField(_) => "BodyFieldBinding",
            ParameterBinding::RawBody(_) => "RawBodyBinding",
        }
    }
}

impl From<QueryBinding> for ParameterBinding {
    fn from(binding: QueryBinding) -> Self {
        ParameterBinding::Query(binding)
    }
}

impl From<BodyFieldBinding> for ParameterBinding {
    fn from(binding: BodyFieldBinding) -> Self {
        ParameterBinding::BodyField(binding)
    }
}

impl From<RawBodyBinding> for ParameterBinding {
    fn from(binding: RawBodyBinding) -> Self {
        ParameterBinding::RawBody(binding)
    }
}

/// Metadata of the handler parameter itself, as declared in the handler
/// signature: its name, its own declared type, whether it has a collection
/// shape, and its own default value.
///
/// A parameter's own default always wins over a binding's declared default.
#[derive(Debug, Clone)]
pub struct ParameterMetadata {
    pub name: String,
    pub type_name: Option<String>,
    pub is_collection: bool,
    pub default_value: Option<Value>,
}

impl ParameterMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            is_collection: false,
            default_value: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn as_collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_binding_name_defaults_to_bind_to() {
        let binding = QueryBinding::new("user_id");
        assert_eq!(binding.name, "user_id");
        let renamed = QueryBinding::new("user").with_name("uid");
        assert_eq!(renamed.bind_to, "user");
        assert_eq!(renamed.name, "uid");
    }

    #[test]
    fn test_shared_accessors_through_enum() {
        let binding: ParameterBinding = RawBodyBinding::new("payload")
            .with_type("CreateUser")
            .with_default(json!("fallback"))
            .with_route("users_create")
            .into();
        assert_eq!(binding.bind_to(), "payload");
        assert_eq!(binding.value_type(), Some("CreateUser"));
        assert_eq!(binding.default_value(), Some(&json!("fallback")));
        assert_eq!(binding.route(), Some("users_create"));
        assert_eq!(binding.kind(), "RawBodyBinding");
    }

    #[test]
    fn test_explicit_null_default_is_a_declared_default() {
        let binding: ParameterBinding = QueryBinding::new("page").with_default(json!(null)).into();
        assert!(binding.has_default());
        assert_eq!(binding.default_value(), Some(&json!(null)));
        assert!(!ParameterBinding::from(QueryBinding::new("page")).has_default());
    }

    #[test]
    fn test_parameter_metadata_builders() {
        let param = ParameterMetadata::new("users")
            .with_type("User")
            .as_collection()
            .with_default(json!([]));
        assert_eq!(param.type_name.as_deref(), Some("User"));
        assert!(param.is_collection);
        assert_eq!(param.default_value, Some(json!([])));
    }
}
