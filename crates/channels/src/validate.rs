//! Core validation runner.
//!
//! Normalizes the envelope and enforces the configured required fields
//! before any channel runs. A clean request is handed to later stages.

use {serde_json::Value, tracing::warn};

use {
    formgate_common::{split_fields, value_len},
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
};

#[derive(Debug, Default)]
pub struct ValidationRunner {
    required_fields: Vec<String>,
}

impl ValidationRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.required_fields = split_fields(&resolver.resolve("REQUIRED_FIELDS").await?);
        Ok(())
    }

    /// Normalize and validate one envelope.
    ///
    /// Field checks run in configured order; the first failure wins.
    pub fn run(
        &self,
        envelope: &Value,
        responder: &ResponseBuilder,
    ) -> Result<NormalizedRequest, Value> {
        let request = NormalizedRequest::parse(envelope.clone());
        if request.has_error {
            return Err(responder.message("Error parsing request", 400));
        }

        for field in &self.required_fields {
            match request.content.get(field) {
                None => {
                    let message = format!("Missing required field `{field}`");
                    warn!(field = %field, "missing required field");
                    return Err(responder.message(&message, 400));
                },
                Some(value) if value_len(value) == 0 => {
                    let message = format!("Required field empty `{field}`");
                    warn!(field = %field, "required field empty");
                    return Err(responder.message(&message, 400));
                },
                Some(_) => {},
            }
        }

        Ok(request)
    }
}
