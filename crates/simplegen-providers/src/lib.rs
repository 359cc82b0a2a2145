//! Chat provider layer for simplegen.
//!
//! # Architecture
//!
//! - [`traits::GenerativeBackend`] — trait the CLI dispatches through
//! - [`dispatcher::ChatDispatcher`] — builds the OpenAI chat completions
//!   request, performs the call, records it, disables the model on error
//! - [`transformers`] — statically registered prompt/extras rewriters
//! - [`validator`] — structural checks on a model's parameters

pub mod dispatcher;
pub mod error;
pub mod traits;
pub mod transformers;
pub mod validator;

// Re-export main types for convenience
pub use dispatcher::{ChatDispatcher, DEFAULT_USER, NO_CONTENT};
pub use error::DispatchError;
pub use traits::GenerativeBackend;
pub use transformers::{FnTransformer, PromptTransformer, PromptTransformers, TransformError};
pub use validator::{model_issues, validate_model, ValidationError};
