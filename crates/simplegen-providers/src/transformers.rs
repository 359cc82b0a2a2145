//! Prompt transformers — extension points that may rewrite the prompt and
//! extras before a call is dispatched.
//!
//! Transformers are registered up front and run in registration order. A
//! transformer that returns an error is skipped: the prompt it was given is
//! passed on to the next one unchanged, and any edits it made to the extras
//! are undone.

use std::fmt;
use std::sync::Arc;

use simplegen_core::store::ModelConfig;
use simplegen_core::types::Extras;
use thiserror::Error;
use tracing::{debug, info};

// ─────────────────────────────────────────────
// Transformer trait
// ─────────────────────────────────────────────

/// Why a transformer declined to run.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The transformer does not handle this model or these extras.
    #[error("not applicable: {0}")]
    NotApplicable(String),

    #[error("transform failed: {0}")]
    Failed(String),
}

/// Rewrites a prompt (and optionally the extras) before dispatch.
pub trait PromptTransformer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Return the prompt to use from here on. `None` means no user message.
    fn update_extras_and_prompt(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<String>,
        extras: &mut Extras,
    ) -> Result<Option<String>, TransformError>;
}

/// Signature accepted by [`FnTransformer`].
pub type TransformFn = dyn Fn(&dyn ModelConfig, Option<String>, &mut Extras) -> Result<Option<String>, TransformError>
    + Send
    + Sync;

/// Closure-backed [`PromptTransformer`].
pub struct FnTransformer {
    name: String,
    f: Box<TransformFn>,
}

impl FnTransformer {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn ModelConfig, Option<String>, &mut Extras) -> Result<Option<String>, TransformError>
            + Send
            + Sync
            + 'static,
    {
        FnTransformer {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl PromptTransformer for FnTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_extras_and_prompt(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<String>,
        extras: &mut Extras,
    ) -> Result<Option<String>, TransformError> {
        (self.f)(model, prompt, extras)
    }
}

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Ordered list of transformers applied before every call.
#[derive(Clone, Default)]
pub struct PromptTransformers {
    transformers: Vec<Arc<dyn PromptTransformer>>,
}

impl PromptTransformers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer. Order of registration is order of application.
    pub fn register(&mut self, transformer: Arc<dyn PromptTransformer>) {
        info!(transformer = transformer.name(), "registered prompt transformer");
        self.transformers.push(transformer);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, transformer: Arc<dyn PromptTransformer>) -> Self {
        self.register(transformer);
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Run every transformer in order, skipping any that fail.
    ///
    /// A failing transformer leaves both the prompt and `extras` as they
    /// were before it ran.
    pub fn apply(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<String>,
        extras: &mut Extras,
    ) -> Option<String> {
        let mut prompt = prompt;
        for transformer in &self.transformers {
            let snapshot = extras.clone();
            match transformer.update_extras_and_prompt(model, prompt.clone(), extras) {
                Ok(updated) => prompt = updated,
                Err(e) => {
                    *extras = snapshot;
                    debug!(
                        transformer = transformer.name(),
                        model = model.name(),
                        error = %e,
                        "skipping prompt transformer"
                    );
                }
            }
        }
        prompt
    }
}

impl fmt::Debug for PromptTransformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use simplegen_core::store::RequestLogEntry;
    use simplegen_core::types::Message;
    use simplegen_core::StoreError;

    struct NullModel;

    impl ModelConfig for NullModel {
        fn name(&self) -> &str {
            "null"
        }
        fn fetch_parameters(&self) -> Result<Map<String, Value>, StoreError> {
            Ok(Map::new())
        }
        fn update_parameters(&self, _updates: Map<String, Value>) -> Result<(), StoreError> {
            Ok(())
        }
        fn set_enabled(&self, _enabled: bool) -> Result<(), StoreError> {
            Ok(())
        }
        fn log_request(
            &self,
            _request: &Value,
            _response: &Value,
            _attempted: bool,
        ) -> Result<RequestLogEntry, StoreError> {
            Err(StoreError::LogEntryNotFound(0))
        }
        fn save_request_log(&self, _entry: &RequestLogEntry) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn shout() -> Arc<dyn PromptTransformer> {
        Arc::new(FnTransformer::new("shout", |_, prompt, _| {
            Ok(prompt.map(|p| p.to_uppercase()))
        }))
    }

    fn broken() -> Arc<dyn PromptTransformer> {
        Arc::new(FnTransformer::new("broken", |_, _, extras| {
            extras.values.insert("touched".to_string(), json!(true));
            Err(TransformError::Failed("boom".to_string()))
        }))
    }

    #[test]
    fn test_empty_registry_passes_through() {
        let registry = PromptTransformers::new();
        let mut extras = Extras::default();
        let out = registry.apply(&NullModel, Some("hi".to_string()), &mut extras);
        assert_eq!(out.as_deref(), Some("hi"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_applied_in_order() {
        let suffix: Arc<dyn PromptTransformer> = Arc::new(FnTransformer::new("suffix", |_, p, _| {
            Ok(p.map(|p| format!("{p}!")))
        }));
        let registry = PromptTransformers::new().with(shout()).with(suffix);

        let mut extras = Extras::default();
        let out = registry.apply(&NullModel, Some("hi".to_string()), &mut extras);
        assert_eq!(out.as_deref(), Some("HI!"));
        assert_eq!(registry.names(), vec!["shout", "suffix"]);
    }

    #[test]
    fn test_failing_transformer_is_skipped() {
        let registry = PromptTransformers::new().with(broken()).with(shout());

        let mut extras = Extras::default();
        let out = registry.apply(&NullModel, Some("hi".to_string()), &mut extras);
        assert_eq!(out.as_deref(), Some("HI"));
        assert_eq!(registry.len(), 2);
        assert!(!extras.values.contains_key("touched"));
    }

    #[test]
    fn test_failing_transformer_changes_are_rolled_back() {
        let half_applied: Arc<dyn PromptTransformer> =
            Arc::new(FnTransformer::new("half-applied", |_, _, extras| {
                extras.messages.push(Message::system("half-applied"));
                Err(TransformError::Failed("gave up midway".to_string()))
            }));
        let registry = PromptTransformers::new().with(half_applied);

        let mut extras = Extras::with_messages(vec![Message::user("earlier")]);
        let out = registry.apply(&NullModel, Some("hi".to_string()), &mut extras);

        assert_eq!(out.as_deref(), Some("hi"));
        assert_eq!(extras.messages, vec![Message::user("earlier")]);
        assert!(extras.values.is_empty());
    }

    #[test]
    fn test_transformer_can_seed_messages_and_clear_prompt() {
        let seeder: Arc<dyn PromptTransformer> = Arc::new(FnTransformer::new("seed", |_, p, extras| {
            if let Some(p) = p {
                extras.messages.push(Message::user(format!("context: {p}")));
            }
            Ok(None)
        }));
        let registry = PromptTransformers::new().with(seeder);

        let mut extras = Extras::default();
        let out = registry.apply(&NullModel, Some("hi".to_string()), &mut extras);
        assert!(out.is_none());
        assert_eq!(extras.messages, vec![Message::user("context: hi")]);
    }

    #[test]
    fn test_not_applicable_keeps_prompt() {
        let picky: Arc<dyn PromptTransformer> = Arc::new(FnTransformer::new("picky", |model, _, _| {
            Err(TransformError::NotApplicable(format!("ignores {}", model.name())))
        }));
        let registry = PromptTransformers::new().with(picky);

        let mut extras = Extras::default();
        assert_eq!(
            registry.apply(&NullModel, None, &mut extras),
            None
        );
        assert_eq!(
            registry.apply(&NullModel, Some("keep".to_string()), &mut extras).as_deref(),
            Some("keep")
        );
    }
}
