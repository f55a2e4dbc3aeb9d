// Ligature - declarative request binding and content negotiation for Rust
//
// This library maps handler parameters to request data through declarative
// bindings, negotiates request and response content types against a
// configurable type registry, and shapes responses from descriptors.

// Re-export core functionality
pub use ligature_core::*;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ArgumentResolver,
        BindingDecl,
        BodyFieldBinding,
        Error,
        HandlerMetadata,
        HttpRequest,
        HttpResponse,
        Negotiator,
        ParameterBinding,
        ParameterMetadata,
        QueryBinding,
        RawBodyBinding,
        ResponseDescriptor,
        ResponseShaper,
        TypeRegistry,
    };
}
