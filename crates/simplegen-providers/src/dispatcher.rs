//! Chat dispatcher for the OpenAI chat completions API.
//!
//! One call is one linear pass: read the model's parameters, let the
//! registered transformers rewrite the prompt, build the message list and
//! request body, POST it, record the exchange, and either return the reply
//! text or disable the model.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use simplegen_core::config::Settings;
use simplegen_core::store::{ModelConfig, RequestLogEntry, DISABLED_REASON, DISABLED_TIME};
use simplegen_core::types::{ChatParameters, Extras, Message};
use simplegen_core::utils;

use crate::error::DispatchError;
use crate::traits::GenerativeBackend;
use crate::transformers::PromptTransformers;
use crate::validator::{self, ValidationError};

/// End-user tag sent when the caller doesn't supply one.
pub const DEFAULT_USER: &str = "openai_user";

/// Returned when a successful response carries no message content.
pub const NO_CONTENT: &str = "(No content returned.)";

// ─────────────────────────────────────────────
// ChatDispatcher
// ─────────────────────────────────────────────

/// Dispatches prompts to an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatDispatcher {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    transformers: PromptTransformers,
}

impl std::fmt::Debug for ChatDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDispatcher")
            .field("api_base", &self.api_base)
            .field("transformers", &self.transformers)
            .finish()
    }
}

impl ChatDispatcher {
    /// Create a dispatcher from settings and the transformers to run before
    /// every call.
    pub fn new(settings: &Settings, transformers: PromptTransformers) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(DispatchError::Client)?;

        Ok(ChatDispatcher {
            client,
            api_base: settings.api_base.clone(),
            transformers,
        })
    }

    /// Build the full chat completions URL.
    pub fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Send `prompt` to `model` and return the reply text.
    ///
    /// Every exchange that yields a JSON body is written to the request log.
    /// If that body carries an `error` object the model is disabled and
    /// [`DispatchError::Provider`] is returned; nothing is retried.
    /// Transport failures and non-JSON bodies surface as
    /// [`DispatchError::Transport`] with no log entry.
    pub async fn run(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<&str>,
        user: &str,
        mut extras: Extras,
    ) -> Result<String, DispatchError> {
        let raw = model.fetch_parameters()?;
        debug!(
            model = model.name(),
            parameters = %serde_json::Value::Object(utils::redact_parameters(&raw)),
            "fetched model parameters"
        );

        let params = ChatParameters::from_map(&raw).map_err(|source| DispatchError::Config {
            model: model.name().to_string(),
            source,
        })?;

        let prompt = self
            .transformers
            .apply(model, prompt.map(String::from), &mut extras);

        let messages = build_messages(prompt.as_deref(), &params, extras.messages);
        let request_body = build_request_body(&params, user, &messages);

        debug!(
            model = model.name(),
            provider_model = params.model(),
            messages = messages.len(),
            "calling chat completions"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(params.api_key())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_json: Value = response.json().await?;

        let entry = model.log_request(&request_body, &response_json, true)?;

        if let Some(provider_error) = response_json.get("error") {
            error!(
                model = model.name(),
                status = %status,
                log_id = entry.id,
                error = %provider_error,
                "provider returned an error, disabling model"
            );
            return Err(disable_model(model, entry, provider_error));
        }

        debug!(model = model.name(), log_id = entry.id, "chat completion received");
        Ok(extract_content(&response_json))
    }
}

#[async_trait]
impl GenerativeBackend for ChatDispatcher {
    fn kind(&self) -> &str {
        "openai_chat"
    }

    async fn run(
        &self,
        model: &dyn ModelConfig,
        prompt: Option<&str>,
        user: &str,
        extras: Extras,
    ) -> Result<String, DispatchError> {
        ChatDispatcher::run(self, model, prompt, user, extras).await
    }

    fn validate(&self, model: &dyn ModelConfig) -> Result<Vec<String>, ValidationError> {
        validator::validate_model(model)
    }
}

// ─────────────────────────────────────────────
// Request / response shaping
// ─────────────────────────────────────────────

/// Assemble the message list: seeded messages, then the prompt as a `user`
/// message (if any), then the system prompt placed per its position.
///
/// An empty or missing system prompt adds nothing.
pub fn build_messages(
    prompt: Option<&str>,
    params: &ChatParameters,
    seed: Vec<Message>,
) -> Vec<Message> {
    let mut messages = seed;

    if let Some(prompt) = prompt {
        messages.push(Message::user(prompt));
    }

    if let Some(system_prompt) = params.system_prompt() {
        let position = params.position();
        if position.leads() {
            messages.insert(0, Message::system(system_prompt));
        }
        if position.trails() {
            messages.push(Message::system(system_prompt));
        }
    }

    messages
}

/// Flat request body: `model`, `user`, `messages`, then `model_parameters`
/// merged on top (a `model_parameters` key wins over the base keys).
pub fn build_request_body(params: &ChatParameters, user: &str, messages: &[Message]) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(params.model().to_string()));
    body.insert("user".to_string(), Value::String(user.to_string()));
    body.insert("messages".to_string(), json!(messages));
    body.extend(params.model_parameters());
    Value::Object(body)
}

/// `choices[0].message.content`, or [`NO_CONTENT`] when any part is missing.
pub fn extract_content(response: &Value) -> String {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or(NO_CONTENT)
        .to_string()
}

/// Disable the model and flag the log entry after a provider error.
///
/// Store failures here are logged and do not replace the provider error.
fn disable_model(
    model: &dyn ModelConfig,
    mut entry: RequestLogEntry,
    provider_error: &Value,
) -> DispatchError {
    if let Err(e) = model.set_enabled(false) {
        warn!(model = model.name(), error = %e, "failed to disable model");
    }

    let mut updates = Map::new();
    updates.insert(
        DISABLED_REASON.to_string(),
        Value::String(format!("Encountered error. See request log ID: {}.", entry.id)),
    );
    updates.insert(DISABLED_TIME.to_string(), Value::String(utils::timestamp()));
    if let Err(e) = model.update_parameters(updates) {
        warn!(model = model.name(), error = %e, "failed to record disabled reason");
    }

    entry.successful = false;
    if let Err(e) = model.save_request_log(&entry) {
        warn!(model = model.name(), log_id = entry.id, error = %e, "failed to flag request log entry");
    }

    let message = provider_error
        .get("message")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| provider_error.to_string());

    DispatchError::Provider {
        model: model.name().to_string(),
        log_id: entry.id,
        message,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
