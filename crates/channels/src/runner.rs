//! The uniform channel-runner contract.

use {
    async_trait::async_trait,
    serde_json::{Map, Value},
    std::collections::HashMap,
};

use {
    formgate_common::field_as_string,
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
};

/// Error message for downstream service, transport, and templating
/// failures. By the time a channel runs, these are internal
/// inconsistencies, not caller mistakes.
pub const NOTIFICATION_SERVICE_ERROR: &str = "Notification service error";

/// Outcome of one channel run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Channel disabled; nothing happened.
    Skipped,
    /// Channel completed, optionally carrying the raw service response.
    Completed(Option<Value>),
    /// Channel failed. `response` is the finished error response,
    /// returned to the caller verbatim. Only the captcha runner populates
    /// `raw`: its callers get the verification metadata even on a failed
    /// verdict.
    Failed {
        response: Value,
        raw: Option<Value>,
    },
}

impl RunOutcome {
    #[must_use]
    pub fn failed(response: Value) -> Self {
        Self::Failed {
            response,
            raw: None,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One optional downstream channel.
///
/// `configure` is idempotent and resolves only the enable flag for a
/// disabled channel. `run` is invoked once per request, after validation
/// has passed.
#[async_trait]
pub trait ChannelRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the channel resolved as enabled. Meaningful after
    /// `configure`.
    fn enabled(&self) -> bool;

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError>;

    async fn run(&self, request: &NormalizedRequest, responder: &ResponseBuilder) -> RunOutcome;
}

/// Extract every configured field's value out of canonical content.
///
/// Returns the missing field name on failure; by this stage a missing
/// field means validation and channel configuration disagree.
pub(crate) fn extract_fields(
    fields: &[String],
    content: &Value,
) -> Result<Map<String, Value>, String> {
    let mut extracted = Map::new();
    for field in fields {
        match content.get(field) {
            Some(value) => {
                extracted.insert(field.clone(), value.clone());
            },
            None => return Err(field.clone()),
        }
    }
    Ok(extracted)
}

/// Render extracted fields as strings for template substitution.
pub(crate) fn template_fields(extracted: &Map<String, Value>) -> HashMap<String, String> {
    extracted
        .iter()
        .map(|(name, value)| (name.clone(), field_as_string(value)))
        .collect()
}
