//! Backend trait — the seam between callers and a concrete chat provider.
//!
//! `ChatDispatcher` in `dispatcher.rs` is the OpenAI chat completions backend.

use async_trait::async_trait;
use simplegen_core::store::ModelConfig;
use simplegen_core::types::Extras;

use crate::error::DispatchError;
use crate::validator::ValidationError;

/// A generative chat backend.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Short identifier for logs and status output.
    fn kind(&self) -> &str;

    /// Send one prompt and return the reply text.
    ///
    /// # Arguments
    /// * `model`  — configuration capability for the model being called.
    /// * `prompt` — user message; `None` sends only seeded/system messages.
    /// * `user`   — end-user tag forwarded to the provider.
    /// * `extras` — optional pre-seeded messages and transformer context.
    async fn run(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<&str>,
        user: &str,
        extras: Extras,
    ) -> Result<String, DispatchError>;

    /// Structural issues with the model's parameters (empty when valid).
    fn validate(&self, model: &dyn ModelConfig) -> Result<Vec<String>, ValidationError>;
}
