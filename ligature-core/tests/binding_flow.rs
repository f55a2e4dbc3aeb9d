// End-to-end tests: handler declarations through argument resolution to
// response shaping, against a single request.

use ligature_core::binding::{ParameterMetadata, QueryBinding, RawBodyBinding};
use ligature_core::metadata::{BindingDecl, HandlerMetadata};
use ligature_core::registry::{RegistryConfig, Toggle, TypeEntry, TypeRegistry};
use ligature_core::response::{ResponseDescriptor, ResponseShaper};
use ligature_core::services::{EntityLookupRegistry, InMemoryEntityLookup, JsonSerializer};
use ligature_core::{ArgumentResolver, Error, HttpRequest};
use serde_json::json;
use std::sync::Arc;

fn handler_metadata() -> Arc<HandlerMetadata> {
    Arc::new(HandlerMetadata::collect([
        BindingDecl::Param(
            QueryBinding::new("author")
                .with_name("author_id")
                .with_repository("users")
                .with_find_by("id")
                .with_type("User")
                .into(),
        ),
        BindingDecl::Param(QueryBinding::new("page").with_default(json!("1")).into()),
        BindingDecl::Param(
            RawBodyBinding::new("draft")
                .with_type("Draft")
                .with_default(json!(null))
                .into(),
        ),
        BindingDecl::Response(
            ResponseDescriptor::new()
                .with_code(201)
                .with_header("Location", "/drafts/[(draft_id)]"),
        ),
    ]))
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::with_config(RegistryConfig {
        negotiation: Some(Toggle { enabled: true }),
        ..Default::default()
    }))
}

fn lookups() -> Arc<EntityLookupRegistry> {
    let users = InMemoryEntityLookup::new()
        .with_entities("User", vec![json!({"id": "7", "name": "ada"})]);
    Arc::new(EntityLookupRegistry::new().with_default(Arc::new(users)))
}

#[test]
fn test_full_request_resolution_and_shaping() {
    let registry = registry();
    let metadata = handler_metadata();
    let request = HttpRequest::new("POST".to_string(), "/drafts".to_string())
        .with_query_param("author_id", "7")
        .with_header("Content-Type", "application/json")
        .with_header("Accept", "application/json")
        .with_body(b"{\"title\":\"negotiation\"}".to_vec());

    let mut resolver = ArgumentResolver::new(Arc::clone(&registry), Arc::clone(&metadata))
        .with_serializer(Arc::new(JsonSerializer::new()))
        .with_lookups(lookups());

    let author = resolver
        .resolve(&request, &ParameterMetadata::new("author"))
        .unwrap();
    assert_eq!(author["name"], json!("ada"));

    // absent query parameter falls back to the binding default
    let page = resolver
        .resolve(&request, &ParameterMetadata::new("page"))
        .unwrap();
    assert_eq!(page, json!("1"));

    let draft = resolver
        .resolve(&request, &ParameterMetadata::new("draft"))
        .unwrap();
    assert_eq!(draft, json!({"title": "negotiation"}));

    // the handler ran; publish context and shape the response
    let mut shaper = ResponseShaper::new(registry, metadata)
        .with_serializer(Arc::new(JsonSerializer::new()));
    shaper.context_mut().insert("draft_id", "31");
    let response = shaper
        .render(&request, &json!({"id": 31, "title": "negotiation"}))
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.header("Location").unwrap(), "/drafts/31");
    assert_eq!(response.header("Content-Type").unwrap(), "application/json");
    assert_eq!(response.body, b"{\"id\":31,\"title\":\"negotiation\"}");
}

#[test]
fn test_unsupported_parameter_is_left_to_other_resolvers() {
    let resolver = ArgumentResolver::new(registry(), handler_metadata());
    let request = HttpRequest::new("POST".to_string(), "/drafts".to_string());
    assert!(!resolver.supports(&request, &ParameterMetadata::new("session")));
    assert!(resolver.supports(&request, &ParameterMetadata::new("page")));
}

#[test]
fn test_accept_negotiation_drives_response_content_type() {
    // a custom registry where csv is registered ahead of json
    let registry = Arc::new(TypeRegistry::with_config(RegistryConfig {
        types: Some(vec![
            TypeEntry::new("json", vec!["application/json".to_string()]),
            TypeEntry::new("csv", vec!["text/csv".to_string()]),
        ]),
        negotiation: Some(Toggle { enabled: true }),
        ..Default::default()
    }));
    let metadata = Arc::new(HandlerMetadata::empty());
    let shaper = ResponseShaper::new(Arc::clone(&registry), metadata);

    let request = HttpRequest::new("GET".to_string(), "/export".to_string())
        .with_header("Accept", "text/csv;q=0.9, application/json;q=0.2");
    let response = shaper.render(&request, &json!("a,b,c")).unwrap();
    assert_eq!(response.header("Content-Type").unwrap(), "text/csv");
    assert_eq!(response.body, b"a,b,c");

    // no acceptable match: the first registered type is the default
    let request = HttpRequest::new("GET".to_string(), "/export".to_string());
    let response = shaper.render(&request, &json!("a,b,c")).unwrap();
    assert_eq!(response.header("Content-Type").unwrap(), "application/json");
}

#[test]
fn test_missing_required_argument_maps_to_server_error() {
    let metadata = Arc::new(HandlerMetadata::collect([BindingDecl::Param(
        QueryBinding::new("token").into(),
    )]));
    let mut resolver = ArgumentResolver::new(registry(), metadata);
    let request = HttpRequest::new("GET".to_string(), "/".to_string());
    let err = resolver
        .resolve(&request, &ParameterMetadata::new("token"))
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvableParameter { .. }));
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("\"token\""));
}
