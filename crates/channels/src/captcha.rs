//! hCaptcha gate.
//!
//! The one channel whose failure is the caller's fault: a missing user
//! response is a 400 and a negative verdict a 401. The raw verification
//! response rides along even on a failed verdict so callers can inspect
//! the metadata.

use {
    async_trait::async_trait,
    secrecy::Secret,
    serde_json::Value,
    tracing::{debug, info, warn},
};

use {
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
    formgate_services::{CaptchaVerifier, HttpPoster},
};

use crate::runner::{ChannelRunner, NOTIFICATION_SERVICE_ERROR, RunOutcome};

#[derive(Debug, Default)]
pub struct CaptchaRunner {
    enabled: bool,
    response_field: String,
    verifier: Option<CaptchaVerifier>,
    poster: HttpPoster,
}

impl CaptchaRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelRunner for CaptchaRunner {
    fn name(&self) -> &'static str {
        "hcaptcha"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.enabled = resolver.resolve_bool("HCAPTCHA_ENABLE").await?;
        debug!(enabled = self.enabled, "hcaptcha configured");
        if !self.enabled {
            return Ok(());
        }

        let sitekey = resolver.resolve("HCAPTCHA_SITEKEY").await?;
        let secret = resolver.resolve("HCAPTCHA_SECRET").await?;
        let verify_url = resolver.resolve("HCAPTCHA_VERIFY_URL").await?;
        self.response_field = resolver.resolve("HCAPTCHA_RESPONSE_FIELD").await?;
        self.verifier = Some(CaptchaVerifier::new(
            Secret::new(secret),
            sitekey,
            verify_url,
        ));
        Ok(())
    }

    async fn run(&self, request: &NormalizedRequest, responder: &ResponseBuilder) -> RunOutcome {
        if !self.enabled {
            return RunOutcome::Skipped;
        }
        let Some(verifier) = &self.verifier else {
            return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
        };

        debug!(field = %self.response_field, "fetching captcha user response");
        let user_response = request
            .content
            .get(&self.response_field)
            .and_then(Value::as_str);
        let Some(user_response) = user_response else {
            warn!(field = %self.response_field, "no captcha user response field in request");
            return RunOutcome::failed(
                responder.message("Missing captcha user response field", 400),
            );
        };

        let remote_ip = request.remote_ip();
        let outcome = verifier
            .verify(&self.poster, user_response, remote_ip.as_deref())
            .await;

        if outcome.http.is_failure() {
            warn!(status = outcome.http.status, "captcha verification HTTP error");
            return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
        }

        let raw = outcome.http.to_value();
        if outcome.success != Some(true) {
            info!("captcha validation failed");
            return RunOutcome::Failed {
                response: responder.message("captcha validation failed", 401),
                raw: Some(raw),
            };
        }

        RunOutcome::Completed(Some(raw))
    }
}
