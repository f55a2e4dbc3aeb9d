// Core library for the Ligature binding layer
// Argument resolution, content negotiation, and response shaping primitives

pub mod binding;
pub mod error;
pub mod http;
pub mod metadata;
pub mod negotiation;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod services;
pub mod status;

// Re-export commonly used types
pub use binding::*;
pub use error::*;
pub use http::*;
pub use metadata::*;
pub use negotiation::*;
pub use registry::*;
pub use resolver::*;
pub use response::*;
pub use services::*;
pub use status::*;
