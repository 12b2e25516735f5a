//! Discord webhook notifier.
//!
//! Executes a webhook built from the configured id and token.
//! <https://discord.com/developers/docs/resources/webhook#execute-webhook>

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use {
    formgate_common::{parse_lenient, split_fields, substitute},
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
    formgate_services::{HttpPoster, JsonWebhook},
};

use crate::runner::{
    ChannelRunner, NOTIFICATION_SERVICE_ERROR, RunOutcome, extract_fields, template_fields,
};

const DISCORD_WEBHOOK_BASE: &str = "https://discord.com/api/webhooks";

pub struct DiscordRunner {
    enabled: bool,
    webhook_id: String,
    webhook_token: Option<Secret<String>>,
    webhook_base: String,
    json_template: String,
    fields: Vec<String>,
    poster: HttpPoster,
}

impl std::fmt::Debug for DiscordRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordRunner")
            .field("enabled", &self.enabled)
            .field("webhook_id", &self.webhook_id)
            .field("webhook_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Default for DiscordRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscordRunner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: false,
            webhook_id: String::new(),
            webhook_token: None,
            webhook_base: DISCORD_WEBHOOK_BASE.to_string(),
            json_template: String::new(),
            fields: Vec::new(),
            poster: HttpPoster::new(),
        }
    }

    /// Override the webhook base URL (tests point it at a local server).
    #[must_use]
    pub fn with_webhook_base(mut self, base: impl Into<String>) -> Self {
        self.webhook_base = base.into();
        self
    }

    fn webhook_url(&self, token: &Secret<String>) -> String {
        format!(
            "{}/{}/{}",
            self.webhook_base,
            self.webhook_id,
            token.expose_secret()
        )
    }
}

#[async_trait]
impl ChannelRunner for DiscordRunner {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.enabled = resolver.resolve_bool("DISCORD_ENABLE").await?;
        debug!(enabled = self.enabled, "discord configured");
        if !self.enabled {
            return Ok(());
        }

        self.webhook_id = resolver.resolve("DISCORD_WEBHOOK_ID").await?;
        self.webhook_token = Some(Secret::new(resolver.resolve("DISCORD_WEBHOOK_TOKEN").await?));
        self.json_template = resolver.resolve("DISCORD_JSON_TEMPLATE").await?;
        if let Err(error) = parse_lenient(&self.json_template) {
            warn!(error = %error, "error decoding Discord JSON template");
            return Err(ConfigError::InvalidTemplate {
                channel: "discord",
                detail: error.to_string(),
            });
        }
        self.fields = split_fields(&resolver.resolve("REQUIRED_FIELDS").await?);
        Ok(())
    }

    async fn run(&self, request: &NormalizedRequest, responder: &ResponseBuilder) -> RunOutcome {
        if !self.enabled {
            return RunOutcome::Skipped;
        }
        let Some(token) = &self.webhook_token else {
            return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
        };

        let extracted = match extract_fields(&self.fields, &request.content) {
            Ok(extracted) => extracted,
            Err(field) => {
                warn!(field = %field, "field extraction error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        let body = match substitute(&self.json_template, &template_fields(&extracted)) {
            Ok(body) => body,
            Err(error) => {
                warn!(error = %error, "Discord template substitution error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        let webhook = match JsonWebhook::new(self.webhook_url(token), &body) {
            Ok(webhook) => webhook,
            Err(error) => {
                warn!(error = %error, "Discord service initiation error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        let response = webhook.send(&self.poster).await;
        if response.is_failure() {
            warn!(status = response.status, "Discord webhook HTTP error");
            return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
        }

        RunOutcome::Completed(Some(response.to_value()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::{Value, json},
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_json, method, path},
        },
    };

    fn resolver_enabled(template: &str, required: &str) -> ValueResolver {
        ValueResolver::standalone()
            .with_override("DISCORD_ENABLE", "true")
            .with_override("DISCORD_WEBHOOK_ID", "1234")
            .with_override("DISCORD_WEBHOOK_TOKEN", "tok-abc")
            .with_override("DISCORD_JSON_TEMPLATE", template)
            .with_override("REQUIRED_FIELDS", required)
    }

    fn request(content: Value) -> NormalizedRequest {
        NormalizedRequest::parse(content)
    }

    fn responder() -> ResponseBuilder {
        ResponseBuilder::from_envelope(&json!({}))
    }

    #[tokio::test]
    async fn disabled_runner_skips_and_configure_is_idempotent() {
        let resolver = ValueResolver::standalone();
        let mut runner = DiscordRunner::new();
        runner.configure(&resolver).await.unwrap();
        runner.configure(&resolver).await.unwrap();

        assert!(!runner.enabled());
        assert!(runner.webhook_token.is_none());

        let outcome = runner.run(&request(json!({})), &responder()).await;
        assert!(matches!(outcome, RunOutcome::Skipped));
    }

    #[tokio::test]
    async fn invalid_template_fails_configuration() {
        let resolver = resolver_enabled("[unclosed", "name");
        let mut runner = DiscordRunner::new();
        assert!(matches!(
            runner.configure(&resolver).await,
            Err(ConfigError::InvalidTemplate { channel: "discord", .. })
        ));
    }

    #[tokio::test]
    async fn posts_to_id_and_token_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1234/tok-abc"))
            .and(body_json(json!({"content": "Ada wrote in"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_enabled(r#"{"content": "${name} wrote in"}"#, "name");
        let mut runner = DiscordRunner::new().with_webhook_base(server.uri());
        runner.configure(&resolver).await.unwrap();

        let outcome = runner
            .run(&request(json!({"name": "Ada"})), &responder())
            .await;
        assert!(matches!(outcome, RunOutcome::Completed(Some(_))));
    }

    #[tokio::test]
    async fn debug_redacts_token() {
        let resolver = resolver_enabled(r#"{"content": "x"}"#, "");
        let mut runner = DiscordRunner::new();
        runner.configure(&resolver).await.unwrap();
        let debug_output = format!("{runner:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok-abc"));
    }

    #[tokio::test]
    async fn webhook_http_error_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let resolver = resolver_enabled(r#"{"content": "${name}"}"#, "name");
        let mut runner = DiscordRunner::new().with_webhook_base(server.uri());
        runner.configure(&resolver).await.unwrap();

        let outcome = runner
            .run(&request(json!({"name": "Ada"})), &responder())
            .await;
        let RunOutcome::Failed { response, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(response["statusCode"], json!(500));
        assert_eq!(response["message"], NOTIFICATION_SERVICE_ERROR);
    }
}
