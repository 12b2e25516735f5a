//! Slack webhook notifier.
//!
//! Posts the substituted JSON template to a Slack incoming webhook.
//! <https://api.slack.com/messaging/webhooks>

use {
    async_trait::async_trait,
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

#[derive(Debug, Default)]
pub struct SlackRunner {
    enabled: bool,
    webhook_url: String,
    json_template: String,
    fields: Vec<String>,
    poster: HttpPoster,
}

impl SlackRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelRunner for SlackRunner {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.enabled = resolver.resolve_bool("SLACK_ENABLE").await?;
        debug!(enabled = self.enabled, "slack configured");
        if !self.enabled {
            return Ok(());
        }

        self.webhook_url = resolver.resolve("SLACK_WEBHOOK_URL").await?;
        self.json_template = resolver.resolve("SLACK_JSON_TEMPLATE").await?;
        if let Err(error) = parse_lenient(&self.json_template) {
            warn!(error = %error, "error decoding Slack JSON template");
            return Err(ConfigError::InvalidTemplate {
                channel: "slack",
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
                warn!(error = %error, "Slack template substitution error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        let webhook = match JsonWebhook::new(self.webhook_url.clone(), &body) {
            Ok(webhook) => webhook,
            Err(error) => {
                warn!(error = %error, "Slack service initiation error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        let response = webhook.send(&self.poster).await;
        if response.is_failure() {
            warn!(status = response.status, "Slack webhook HTTP error");
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

    fn resolver_enabled(webhook_url: &str, template: &str, required: &str) -> ValueResolver {
        ValueResolver::standalone()
            .with_override("SLACK_ENABLE", "true")
            .with_override("SLACK_WEBHOOK_URL", webhook_url)
            .with_override("SLACK_JSON_TEMPLATE", template)
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
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();
        runner.configure(&resolver).await.unwrap();

        assert!(!runner.enabled());
        assert!(runner.webhook_url.is_empty());
        assert!(runner.fields.is_empty());

        let outcome = runner.run(&request(json!({})), &responder()).await;
        assert!(matches!(outcome, RunOutcome::Skipped));
    }

    #[tokio::test]
    async fn invalid_template_fails_configuration() {
        let resolver = resolver_enabled("https://example.invalid/hook", "{not json", "name");
        let mut runner = SlackRunner::new();
        let result = runner.configure(&resolver).await;
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTemplate { channel: "slack", .. })
        ));
    }

    #[tokio::test]
    async fn sends_substituted_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({"text": "From Ada: hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_enabled(
            &format!("{}/hook", server.uri()),
            r#"{"text": "From ${name}: ${message}"}"#,
            "name,message",
        );
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();

        let outcome = runner
            .run(
                &request(json!({"name": "Ada", "message": "hello"})),
                &responder(),
            )
            .await;
        let RunOutcome::Completed(Some(raw)) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(raw["status"], json!(200));
    }

    #[tokio::test]
    async fn template_referencing_absent_field_is_service_error() {
        let resolver = resolver_enabled(
            "https://example.invalid/hook",
            r#"{"text": "${phone}"}"#,
            "name",
        );
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();

        let outcome = runner
            .run(&request(json!({"name": "Ada"})), &responder())
            .await;
        let RunOutcome::Failed { response, raw } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(response["statusCode"], json!(500));
        assert_eq!(response["message"], NOTIFICATION_SERVICE_ERROR);
        assert!(raw.is_none());
    }

    #[tokio::test]
    async fn missing_content_field_is_service_error() {
        let resolver = resolver_enabled(
            "https://example.invalid/hook",
            r#"{"text": "${name}"}"#,
            "name",
        );
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();

        let outcome = runner.run(&request(json!({})), &responder()).await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn webhook_http_error_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolver = resolver_enabled(&server.uri(), r#"{"text": "${name}"}"#, "name");
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();

        let outcome = runner
            .run(&request(json!({"name": "Ada"})), &responder())
            .await;
        let RunOutcome::Failed { response, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(response["message"], NOTIFICATION_SERVICE_ERROR);
    }

    #[tokio::test]
    async fn user_input_breaking_template_json_is_service_error() {
        let resolver = resolver_enabled(
            "https://example.invalid/hook",
            r#"{"text": "${message}"}"#,
            "message",
        );
        let mut runner = SlackRunner::new();
        runner.configure(&resolver).await.unwrap();

        // The quote in the field value breaks the substituted JSON.
        let outcome = runner
            .run(&request(json!({"message": "a\"b\"c\\"})), &responder())
            .await;
        assert!(outcome.is_failed());
    }
}
