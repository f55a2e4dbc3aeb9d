//! Handler metadata collection.
//!
//! Consumes the ordered, mixed list of declarations attached to a handler
//! and produces the active binding set: a target-slot-to-binding map with
//! explicit last-wins overwrite semantics, plus the response descriptors in
//! declaration order.

use crate::binding::{ParameterBinding, QueryBinding};
use crate::response::ResponseDescriptor;
use std::collections::HashMap;

/// One declaration attached to a handler.
#[derive(Debug, Clone)]
pub enum BindingDecl {
    /// A single parameter binding.
    Param(ParameterBinding),
    /// A group of query bindings declared together.
    Params(Vec<QueryBinding>),
    /// A response descriptor.
    Response(ResponseDescriptor),
}

impl From<ParameterBinding> for BindingDecl {
    fn from(binding: ParameterBinding) -> Self {
        BindingDecl::Param(binding)
    }
}

impl From<ResponseDescriptor> for BindingDecl {
    fn from(descriptor: ResponseDescriptor) -> Self {
        BindingDecl::Response(descriptor)
    }
}

/// The active binding set of one handler.
///
/// Collected once per handler and reused for the handler's lifetime.
#[derive(Debug, Clone, Default)]
pub struct HandlerMetadata {
    params: HashMap<String, ParameterBinding>,
    responses: Vec<ResponseDescriptor>,
}

impl HandlerMetadata {
    /// An empty binding set, for handlers with no declarations or handlers
    /// whose declarations could not be introspected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collect declarations in order.
    ///
    /// Target-slot identifiers are unique per handler: a later declaration
    /// with the same `bind_to` overwrites the earlier one (last wins).
    /// Response descriptors are kept in declaration order; which of them
    /// apply is decided by the [`ResponseShaper`](crate::ResponseShaper).
    pub fn collect(decls: impl IntoIterator<Item = BindingDecl>) -> Self {
        let mut metadata = Self::default();
        for decl in decls {
            match decl {
                BindingDecl::Param(binding) => metadata.insert(binding),
                BindingDecl::Params(group) => {
                    for binding in group {
                        metadata.insert(ParameterBinding::Query(binding));
                    }
                }
                BindingDecl::Response(descriptor) => metadata.responses.push(descriptor),
            }
        }
        metadata
    }

    fn insert(&mut self, binding: ParameterBinding) {
        let slot = binding.bind_to().to_string();
        if self.params.insert(slot.clone(), binding).is_some() {
            tracing::debug!(slot = %slot, "parameter binding overwritten by later declaration");
        }
    }

    /// Look up the binding for a target slot.
    pub fn binding(&self, slot: &str) -> Option<&ParameterBinding> {
        self.params.get(slot)
    }

    /// All collected parameter bindings, keyed by target slot.
    pub fn params(&self) -> &HashMap<String, ParameterBinding> {
        &self.params
    }

    /// Response descriptors in declaration order.
    pub fn responses(&self) -> &[ResponseDescriptor] {
        &self.responses
    }

    pub fn has_bindings(&self) -> bool {
        !self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BodyFieldBinding, QueryBinding};
    use serde_json::json;

    #[test]
    fn test_empty_handler_yields_empty_metadata() {
        let metadata = HandlerMetadata::collect([]);
        assert!(metadata.params().is_empty());
        assert!(metadata.responses().is_empty());
        assert!(!metadata.has_bindings());
    }

    #[test]
    fn test_last_declaration_wins_for_same_slot() {
        let metadata = HandlerMetadata::collect([
            BindingDecl::Param(QueryBinding::new("value").with_default(json!("first")).into()),
            BindingDecl::Param(BodyFieldBinding::new("value").with_name("field").into()),
        ]);
        assert_eq!(metadata.params().len(), 1);
        let binding = metadata.binding("value").unwrap();
        assert_eq!(binding.kind(), "BodyFieldBinding");
    }

    #[test]
    fn test_grouped_params_expand_in_order() {
        let metadata = HandlerMetadata::collect([
            BindingDecl::Params(vec![QueryBinding::new("page"), QueryBinding::new("limit")]),
            BindingDecl::Param(QueryBinding::new("page").with_default(json!(1)).into()),
        ]);
        assert_eq!(metadata.params().len(), 2);
        // the later single declaration overwrote the grouped one
        assert_eq!(
            metadata.binding("page").unwrap().default_value(),
            Some(&json!(1))
        );
    }

    #[test]
    fn test_response_descriptors_keep_declaration_order() {
        let metadata = HandlerMetadata::collect([
            BindingDecl::Response(ResponseDescriptor::new().with_code(201)),
            BindingDecl::Response(ResponseDescriptor::new().with_code(404)),
        ]);
        assert_eq!(metadata.responses().len(), 2);
        assert_eq!(metadata.responses()[0].code, Some(201));
        assert_eq!(metadata.responses()[1].code, Some(404));
    }
}
