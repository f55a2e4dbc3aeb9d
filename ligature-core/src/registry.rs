//! Type registry and configuration resolution.
//!
//! Maps logical type keys (e.g. `"json"`) to ordered lists of concrete
//! media-type values, resolves a request's effective content and accept
//! types, and exposes the feature toggles the binding pipeline consults.
//!
//! Raw configuration is loaded once at startup; the derived state (merged
//! type map, flattened priorities, header names, toggles) is computed
//! lazily on first use, at most once, and shared read-only afterwards.

use crate::{HttpRequest, NegotiationResult, Negotiator};
use once_cell::sync::OnceCell;
use serde::Deserialize;

// ============================================================================
// Raw configuration
// ============================================================================

/// One logical type key with its ordered media-type values.
///
/// The first value is the canonical/default value for the key.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    pub values: Vec<String>,
}

impl TypeEntry {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A boolean feature toggle section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Toggle {
    pub enabled: bool,
}

/// Header name overrides for the two negotiation axes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    pub content_type: Option<String>,
    pub accept_type: Option<String>,
}

/// Raw registry configuration, loaded once at startup.
///
/// A declared `types` section fully replaces the default type list; a
/// declared `append_types` section is merged item-by-item into the list,
/// where an entry whose key matches an existing entry replaces that entry's
/// value list (no union) and a new key is appended.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub types: Option<Vec<TypeEntry>>,
    pub append_types: Option<Vec<TypeEntry>>,
    pub headers: Option<HeaderNames>,
    pub negotiation: Option<Toggle>,
    pub serializer: Option<Toggle>,
    pub normalizer: Option<Toggle>,
    pub validator: Option<Toggle>,
}

// ============================================================================
// Derived state
// ============================================================================

#[derive(Debug)]
struct ParsedConfig {
    /// Type map in declaration order.
    types: Vec<(String, Vec<String>)>,
    /// Flattened media-type priority list across all keys.
    priorities: Vec<String>,
    /// First declared key's first value.
    default_type: NegotiationResult,
    content_type_header: String,
    accept_type_header: String,
    negotiation_enabled: bool,
    serializer_enabled: bool,
    normalizer_enabled: bool,
    validator_enabled: bool,
}

fn default_types() -> Vec<TypeEntry> {
    vec![
        TypeEntry::new(
            "json",
            vec!["application/json".to_string(), "text/json".to_string()],
        ),
        TypeEntry::new(
            "xml",
            vec!["application/xml".to_string(), "text/xml".to_string()],
        ),
    ]
}

// ============================================================================
// TypeRegistry
// ============================================================================

/// Process-wide registry of configured types and feature toggles.
///
/// Derived configuration is initialized on first use via [`OnceCell`], so
/// concurrent first access is race-free and requests that never touch this
/// module pay nothing. None of the resolution operations fail: absence of a
/// match always degrades to the configured default or `None`.
#[derive(Debug)]
pub struct TypeRegistry {
    raw: RegistryConfig,
    negotiator: Negotiator,
    parsed: OnceCell<ParsedConfig>,
}

impl TypeRegistry {
    /// Create a registry carrying only the default seed configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry from a raw configuration blob.
    pub fn with_config(raw: RegistryConfig) -> Self {
        Self {
            raw,
            negotiator: Negotiator::new(),
            parsed: OnceCell::new(),
        }
    }

    fn parsed(&self) -> &ParsedConfig {
        self.parsed.get_or_init(|| {
            let parsed = Self::merge(&self.raw);
            tracing::debug!(
                types = parsed.types.len(),
                negotiation = parsed.negotiation_enabled,
                "type registry initialized"
            );
            parsed
        })
    }

    fn merge(raw: &RegistryConfig) -> ParsedConfig {
        let mut entries = default_types();
        if let Some(types) = &raw.types {
            if !types.is_empty() {
                entries = types.clone();
            }
        }
        if let Some(appended) = &raw.append_types {
            for item in appended {
                if item.values.is_empty() {
                    continue;
                }
                match entries.iter_mut().find(|e| e.name == item.name) {
                    // A matching key replaces the value list entirely.
                    Some(existing) => existing.values = item.values.clone(),
                    None => entries.push(item.clone()),
                }
            }
        }

        let types: Vec<(String, Vec<String>)> = entries
            .into_iter()
            .filter(|e| !e.values.is_empty())
            .map(|e| (e.name, e.values))
            .collect();
        let priorities = types.iter().flat_map(|(_, v)| v.iter().cloned()).collect();
        let default_type = types
            .first()
            .map(|(name, values)| NegotiationResult::new(name.clone(), values[0].clone()))
            .unwrap_or_else(|| NegotiationResult::new("json", "application/json"));

        let headers = raw.headers.clone().unwrap_or_default();

        ParsedConfig {
            types,
            priorities,
            default_type,
            content_type_header: headers
                .content_type
                .unwrap_or_else(|| "content-type".to_string()),
            accept_type_header: headers.accept_type.unwrap_or_else(|| "accept".to_string()),
            negotiation_enabled: raw.negotiation.map(|t| t.enabled).unwrap_or(false),
            serializer_enabled: raw.serializer.map(|t| t.enabled).unwrap_or(true),
            normalizer_enabled: raw.normalizer.map(|t| t.enabled).unwrap_or(false),
            validator_enabled: raw.validator.map(|t| t.enabled).unwrap_or(false),
        }
    }

    /// Resolve a configured header name. Accepts both hyphen and underscore
    /// spellings of the axis key (`content-type`/`content_type`,
    /// `accept-type`/`accept_type`).
    pub fn header_name(&self, key: &str) -> Option<&str> {
        let parsed = self.parsed();
        match key.replace('-', "_").as_str() {
            "content_type" => Some(parsed.content_type_header.as_str()),
            "accept_type" => Some(parsed.accept_type_header.as_str()),
            _ => None,
        }
    }

    /// Resolve the request's effective content type.
    ///
    /// When negotiation is enabled the full flattened priority list is
    /// negotiated against the configured content-type header; no match, or
    /// negotiation disabled, yields the configured default type.
    pub fn resolve_content_type(&self, request: &HttpRequest) -> NegotiationResult {
        let header = self.parsed().content_type_header.clone();
        self.resolve_request_type(request, &header)
    }

    /// Resolve the type the response should be rendered as, from the
    /// configured accept header. Symmetric with [`resolve_content_type`].
    ///
    /// [`resolve_content_type`]: TypeRegistry::resolve_content_type
    pub fn resolve_accept_type(&self, request: &HttpRequest) -> NegotiationResult {
        let header = self.parsed().accept_type_header.clone();
        self.resolve_request_type(request, &header)
    }

    fn resolve_request_type(&self, request: &HttpRequest, header_name: &str) -> NegotiationResult {
        let parsed = self.parsed();
        if parsed.negotiation_enabled {
            let header_value = request.header(header_name).map(|v| v.as_str());
            if let Some(value) = self.negotiator.negotiate(&parsed.priorities, header_value) {
                if let Some(result) = self.wrap_value(&value) {
                    return result;
                }
            }
            tracing::debug!(header = header_name, "no negotiated match, using default type");
        }
        parsed.default_type.clone()
    }

    /// Map a concrete media-type value back to its logical key.
    fn wrap_value(&self, value: &str) -> Option<NegotiationResult> {
        for (name, values) in &self.parsed().types {
            if values.iter().any(|v| v == value) {
                return Some(NegotiationResult::new(name.clone(), value.to_string()));
            }
        }
        None
    }

    /// Look up a logical type key, returning the media-type value at the
    /// given priority index, or `None` for an unknown key or index.
    pub fn get_type_from_key(&self, key: &str, priority: usize) -> Option<NegotiationResult> {
        let (name, values) = self.parsed().types.iter().find(|(name, _)| name == key)?;
        values
            .get(priority)
            .map(|value| NegotiationResult::new(name.clone(), value.clone()))
    }

    /// Ordered media-type values configured for a key.
    pub fn type_values(&self, key: &str) -> Option<&[String]> {
        self.parsed()
            .types
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Logical name of the request's effective content type.
    pub fn content_type_name(&self, request: &HttpRequest) -> String {
        self.resolve_content_type(request).name().to_string()
    }

    /// Logical name of the type the response should be rendered as.
    pub fn accept_type_name(&self, request: &HttpRequest) -> String {
        self.resolve_accept_type(request).name().to_string()
    }

    pub fn is_negotiation_enabled(&self) -> bool {
        self.parsed().negotiation_enabled
    }

    pub fn is_serializer_enabled(&self) -> bool {
        self.parsed().serializer_enabled
    }

    pub fn is_normalizer_enabled(&self) -> bool {
        self.parsed().normalizer_enabled
    }

    pub fn is_validator_enabled(&self) -> bool {
        self.parsed().validator_enabled
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpRequest;

    fn entry(name: &str, values: &[&str]) -> TypeEntry {
        TypeEntry::new(name, values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_default_seed_types() {
        let registry = TypeRegistry::new();
        let json = registry.get_type_from_key("json", 0).unwrap();
        assert_eq!(json.name(), "json");
        assert_eq!(json.value(), "application/json");
        assert_eq!(
            registry.get_type_from_key("json", 1).unwrap().value(),
            "text/json"
        );
        assert_eq!(
            registry.get_type_from_key("xml", 0).unwrap().value(),
            "application/xml"
        );
        assert_eq!(registry.get_type_from_key("html", 0), None);
    }

    #[test]
    fn test_default_toggles() {
        let registry = TypeRegistry::new();
        assert!(!registry.is_negotiation_enabled());
        assert!(registry.is_serializer_enabled());
        assert!(!registry.is_normalizer_enabled());
        assert!(!registry.is_validator_enabled());
    }

    #[test]
    fn test_types_section_replaces_defaults() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            types: Some(vec![entry("html", &["text/html"])]),
            ..Default::default()
        });
        assert_eq!(registry.get_type_from_key("json", 0), None);
        assert_eq!(
            registry.get_type_from_key("html", 0).unwrap().value(),
            "text/html"
        );
    }

    #[test]
    fn test_append_types_replaces_matching_key_list() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            append_types: Some(vec![entry("json", &["foo/bar", "bar/baz"])]),
            ..Default::default()
        });
        assert_eq!(
            registry.get_type_from_key("json", 0).unwrap().value(),
            "foo/bar"
        );
        assert_eq!(
            registry.get_type_from_key("json", 1).unwrap().value(),
            "bar/baz"
        );
        // the default list is replaced, not unioned
        assert_eq!(registry.get_type_from_key("json", 2), None);
        // unrelated defaults survive
        assert_eq!(
            registry.get_type_from_key("xml", 0).unwrap().value(),
            "application/xml"
        );
    }

    #[test]
    fn test_append_types_adds_new_key() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            append_types: Some(vec![entry("html", &["text/html"])]),
            ..Default::default()
        });
        assert_eq!(
            registry.get_type_from_key("html", 0).unwrap().value(),
            "text/html"
        );
        assert_eq!(
            registry.get_type_from_key("json", 0).unwrap().value(),
            "application/json"
        );
    }

    #[test]
    fn test_key_lookup_values_are_members_of_configured_list() {
        let registry = TypeRegistry::new();
        for key in ["json", "xml"] {
            let values = registry.type_values(key).unwrap().to_vec();
            for priority in 0..values.len() {
                let result = registry.get_type_from_key(key, priority).unwrap();
                assert!(values.contains(&result.value().to_string()));
            }
        }
    }

    #[test]
    fn test_negotiation_disabled_returns_default() {
        let registry = TypeRegistry::new();
        let request = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_header("accept", "application/xml");
        let resolved = registry.resolve_accept_type(&request);
        assert_eq!(resolved.name(), "json");
        assert_eq!(resolved.value(), "application/json");
    }

    #[test]
    fn test_negotiated_accept_type() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            negotiation: Some(Toggle { enabled: true }),
            ..Default::default()
        });
        let request = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_header("Accept", "application/xml;q=0.9, text/html;q=0.5");
        let resolved = registry.resolve_accept_type(&request);
        assert_eq!(resolved.name(), "xml");
        assert_eq!(resolved.value(), "application/xml");
    }

    #[test]
    fn test_negotiation_without_match_degrades_to_default() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            negotiation: Some(Toggle { enabled: true }),
            ..Default::default()
        });
        let request = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_header("Accept", "text/html");
        let resolved = registry.resolve_accept_type(&request);
        assert_eq!(resolved.name(), "json");
    }

    #[test]
    fn test_negotiation_degrades_on_hostile_header_value() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            negotiation: Some(Toggle { enabled: true }),
            ..Default::default()
        });
        let request = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_header("Accept", "İİİİ;q=1");
        let resolved = registry.resolve_accept_type(&request);
        assert_eq!(resolved.name(), "json");
        assert_eq!(resolved.value(), "application/json");
    }

    #[test]
    fn test_header_name_overrides_and_spellings() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            headers: Some(HeaderNames {
                content_type: Some("x-content".to_string()),
                accept_type: None,
            }),
            ..Default::default()
        });
        assert_eq!(registry.header_name("content-type"), Some("x-content"));
        assert_eq!(registry.header_name("content_type"), Some("x-content"));
        assert_eq!(registry.header_name("accept-type"), Some("accept"));
        assert_eq!(registry.header_name("unknown"), None);
    }

    #[test]
    fn test_content_type_resolution_uses_overridden_header() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            negotiation: Some(Toggle { enabled: true }),
            headers: Some(HeaderNames {
                content_type: Some("x-content".to_string()),
                accept_type: None,
            }),
            ..Default::default()
        });
        let request = HttpRequest::new("POST".to_string(), "/".to_string())
            .with_header("x-content", "text/xml");
        let resolved = registry.resolve_content_type(&request);
        assert_eq!(resolved.name(), "xml");
        assert_eq!(resolved.value(), "text/xml");
    }

    #[test]
    fn test_logical_name_conveniences() {
        let registry = TypeRegistry::new();
        let request = HttpRequest::new("GET".to_string(), "/".to_string());
        assert_eq!(registry.content_type_name(&request), "json");
        assert_eq!(registry.accept_type_name(&request), "json");
    }
}
