//! Email notifier.
//!
//! Substitutes the subject and text templates and hands the result to the
//! injected mail capability.

use {
    async_trait::async_trait,
    std::sync::Arc,
    tracing::{debug, warn},
};

use {
    formgate_common::{split_fields, substitute},
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
    formgate_services::Mailer,
};

use crate::runner::{
    ChannelRunner, NOTIFICATION_SERVICE_ERROR, RunOutcome, extract_fields, template_fields,
};

pub struct EmailRunner {
    enabled: bool,
    sender: String,
    recipients: String,
    subject_template: String,
    text_template: String,
    fields: Vec<String>,
    mailer: Arc<dyn Mailer>,
}

impl std::fmt::Debug for EmailRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailRunner")
            .field("enabled", &self.enabled)
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

impl EmailRunner {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            enabled: false,
            sender: String::new(),
            recipients: String::new(),
            subject_template: String::new(),
            text_template: String::new(),
            fields: Vec::new(),
            mailer,
        }
    }
}

#[async_trait]
impl ChannelRunner for EmailRunner {
    fn name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.enabled = resolver.resolve_bool("EMAIL_ENABLE").await?;
        debug!(enabled = self.enabled, "email sending configured");
        if !self.enabled {
            return Ok(());
        }

        self.sender = resolver.resolve("EMAIL_SENDER").await?;
        self.recipients = resolver.resolve("EMAIL_RECIPIENTS").await?;
        self.subject_template = resolver.resolve("EMAIL_SUBJECT_TEMPLATE").await?;
        self.text_template = resolver.resolve("EMAIL_TEXT_TEMPLATE").await?;
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
        let rendered = template_fields(&extracted);

        let (subject, text) = match (
            substitute(&self.subject_template, &rendered),
            substitute(&self.text_template, &rendered),
        ) {
            (Ok(subject), Ok(text)) => (subject, text),
            (Err(error), _) | (_, Err(error)) => {
                warn!(error = %error, "email template substitution error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };

        match self
            .mailer
            .send_text(&self.recipients, &self.sender, &subject, &text)
            .await
        {
            Ok(ack) => RunOutcome::Completed(Some(ack)),
            Err(error) => {
                warn!(error = %error, "email sending error");
                RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500))
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        formgate_services::{NoopMailer, ServiceResult},
        serde_json::{Value, json},
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_text(
            &self,
            recipients: &str,
            sender: &str,
            subject: &str,
            text: &str,
        ) -> ServiceResult {
            self.sent.lock().unwrap().push((
                recipients.to_string(),
                sender.to_string(),
                subject.to_string(),
                text.to_string(),
            ));
            Ok(json!({"MessageId": "msg-1"}))
        }
    }

    fn resolver_enabled() -> ValueResolver {
        ValueResolver::standalone()
            .with_override("EMAIL_ENABLE", "true")
            .with_override("EMAIL_SENDER", "noreply@example.com")
            .with_override("EMAIL_RECIPIENTS", "owner@example.com")
            .with_override("EMAIL_SUBJECT_TEMPLATE", "Contact from ${name}")
            .with_override("EMAIL_TEXT_TEMPLATE", "${name} says: ${message}")
            .with_override("REQUIRED_FIELDS", "name,message")
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
        let mut runner = EmailRunner::new(Arc::new(NoopMailer));
        runner.configure(&resolver).await.unwrap();
        runner.configure(&resolver).await.unwrap();

        assert!(!runner.enabled());
        assert!(runner.sender.is_empty());

        let outcome = runner.run(&request(json!({})), &responder()).await;
        assert!(matches!(outcome, RunOutcome::Skipped));
    }

    #[tokio::test]
    async fn enabled_without_sender_fails_configuration() {
        let resolver = ValueResolver::standalone().with_override("EMAIL_ENABLE", "true");
        let mut runner = EmailRunner::new(Arc::new(NoopMailer));
        assert!(runner.configure(&resolver).await.is_err());
    }

    #[tokio::test]
    async fn sends_substituted_subject_and_text() {
        let mailer = Arc::new(RecordingMailer::default());
        let mut runner = EmailRunner::new(Arc::clone(&mailer) as Arc<dyn Mailer>);
        runner.configure(&resolver_enabled()).await.unwrap();

        let outcome = runner
            .run(
                &request(json!({"name": "Ada", "message": "hello"})),
                &responder(),
            )
            .await;
        let RunOutcome::Completed(Some(ack)) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(ack["MessageId"], "msg-1");

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (recipients, sender, subject, text) = &sent[0];
        assert_eq!(recipients, "owner@example.com");
        assert_eq!(sender, "noreply@example.com");
        assert_eq!(subject, "Contact from Ada");
        assert_eq!(text, "Ada says: hello");
    }

    #[tokio::test]
    async fn missing_content_field_is_service_error() {
        let mailer = Arc::new(RecordingMailer::default());
        let mut runner = EmailRunner::new(Arc::clone(&mailer) as Arc<dyn Mailer>);
        runner.configure(&resolver_enabled()).await.unwrap();

        let outcome = runner
            .run(&request(json!({"name": "Ada"})), &responder())
            .await;
        let RunOutcome::Failed { response, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(response["statusCode"], json!(500));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_send_is_service_error() {
        let mut runner = EmailRunner::new(Arc::new(NoopMailer));
        runner.configure(&resolver_enabled()).await.unwrap();

        let outcome = runner
            .run(
                &request(json!({"name": "Ada", "message": "hello"})),
                &responder(),
            )
            .await;
        let RunOutcome::Failed { response, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(response["message"], NOTIFICATION_SERVICE_ERROR);
    }
}
