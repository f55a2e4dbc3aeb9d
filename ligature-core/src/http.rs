// HTTP request and response types

use serde_json::Value;
use std::collections::HashMap;

/// HTTP request wrapper
///
/// The binding layer reads five request surfaces: query parameters, the
/// structured body-parameter collection (decoded form fields), the raw body
/// bytes, headers, and the matched route name. How those surfaces were
/// populated (server, test harness) is not this layer's concern.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
    /// Structured body parameters, e.g. decoded form fields.
    pub form_params: HashMap<String, Value>,
    /// Name of the route the request was matched to, if any.
    pub route_name: Option<String>,
}

impl HttpRequest {
    pub fn new(method: String, path: String) -> Self {
        Self {
            method,
            path,
            headers: HashMap::new(),
            body: Vec::new(),
            query_params: HashMap::new(),
            form_params: HashMap::new(),
            route_name: None,
        }
    }

    /// Populate query parameters from a raw query string
    pub fn with_query_string(mut self, query: &str) -> Result<Self, crate::Error> {
        let parsed: HashMap<String, String> = serde_urlencoded::from_str(query)
            .map_err(|e| crate::Error::Deserialization(format!("Invalid query string: {}", e)))?;
        self.query_params.extend(parsed);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn with_form_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.form_params.insert(name.into(), value);
        self
    }

    pub fn with_route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Get a structured body parameter by name
    pub fn form(&self, name: &str) -> Option<&Value> {
        self.form_params.get(name)
    }

    /// Get a header value by name, tolerating case differences
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_lowercase()))
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
    }

    /// Get the matched route name
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Get a header value by name, tolerating case differences
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_parsing() {
        let req = HttpRequest::new("GET".to_string(), "/users".to_string())
            .with_query_string("page=1&name=ada")
            .unwrap();
        assert_eq!(req.query("page"), Some(&"1".to_string()));
        assert_eq!(req.query("name"), Some(&"ada".to_string()));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn test_header_lookup_is_case_tolerant() {
        let req = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some(&"application/json".to_string()));
        assert_eq!(req.header("Content-Type"), Some(&"application/json".to_string()));
    }

    #[test]
    fn test_form_params() {
        let req = HttpRequest::new("POST".to_string(), "/".to_string())
            .with_form_param("age", json!(30));
        assert_eq!(req.form("age"), Some(&json!(30)));
    }

    #[test]
    fn test_route_name() {
        let req = HttpRequest::new("GET".to_string(), "/".to_string())
            .with_route_name("admin_edit");
        assert_eq!(req.route_name(), Some("admin_edit"));
    }
}
