//! JSON webhook sender.
//!
//! The body is validated as JSON at construction so a broken payload is a
//! configuration-time error, not a surprise at send time.

use {serde_json::Value, tracing::debug};

use formgate_common::parse_lenient;

use crate::{
    error::{ServiceError, ServiceResult},
    http::{HttpOutcome, HttpPoster},
};

/// A validated JSON payload bound to a webhook URL.
#[derive(Debug, Clone)]
pub struct JsonWebhook {
    url: String,
    body: String,
}

impl JsonWebhook {
    /// Validate `body` as (lenient) JSON and bind it to `url`.
    pub fn new(url: impl Into<String>, body: &str) -> ServiceResult<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(ServiceError::message("missing webhook URL"));
        }

        let value: Value = parse_lenient(body)?;
        let canonical = serde_json::to_string(&value)?;

        debug!(url = %url, "webhook configured");
        Ok(Self {
            url,
            body: canonical,
        })
    }

    pub async fn send(&self, poster: &HttpPoster) -> HttpOutcome {
        poster.post_json(&self.url, &self.body).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_json, method, path},
        },
    };

    #[test]
    fn rejects_invalid_json_body() {
        assert!(JsonWebhook::new("https://example.invalid/hook", "{not json").is_err());
    }

    #[test]
    fn rejects_empty_url() {
        assert!(JsonWebhook::new("", "{}").is_err());
    }

    #[test]
    fn accepts_control_characters_in_strings() {
        let webhook = JsonWebhook::new("https://example.invalid/hook", "{\"text\": \"a\nb\"}");
        assert!(webhook.is_ok());
    }

    #[tokio::test]
    async fn sends_canonicalized_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let webhook =
            JsonWebhook::new(format!("{}/hook", server.uri()), r#"{ "text" : "hello" }"#).unwrap();
        let outcome = webhook.send(&HttpPoster::new()).await;

        assert_eq!(outcome.status, Some(200));
    }
}
