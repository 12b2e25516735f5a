//! hCaptcha verification client.
//!
//! <https://docs.hcaptcha.com/#verify-the-user-response-server-side>

use {
    secrecy::{ExposeSecret, Secret},
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::http::{HttpOutcome, HttpPoster};

/// Fallback client address reported when the envelope carried none.
const DEFAULT_REMOTE_IP: &str = "127.0.0.1";

/// Posts user challenge responses to the verification endpoint.
pub struct CaptchaVerifier {
    secret: Secret<String>,
    sitekey: String,
    verify_url: String,
}

impl std::fmt::Debug for CaptchaVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaVerifier")
            .field("secret", &"[REDACTED]")
            .field("sitekey", &self.sitekey)
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

/// Result of one verification call: the raw HTTP outcome plus the verdict
/// lifted out of the response body.
///
/// `success` stays `None` when the call never reached a usable response.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub http: HttpOutcome,
    pub success: Option<bool>,
    pub error_codes: Vec<String>,
}

impl CaptchaVerifier {
    #[must_use]
    pub fn new(
        secret: Secret<String>,
        sitekey: impl Into<String>,
        verify_url: impl Into<String>,
    ) -> Self {
        let verify_url = verify_url.into();
        debug!(url = %verify_url, "captcha verifier configured");
        Self {
            secret,
            sitekey: sitekey.into(),
            verify_url,
        }
    }

    /// Verify a user-supplied challenge response.
    ///
    /// <https://docs.hcaptcha.com/#siteverify-error-codes-table>
    pub async fn verify(
        &self,
        poster: &HttpPoster,
        user_response: &str,
        remote_ip: Option<&str>,
    ) -> VerifyOutcome {
        let remote_ip = remote_ip.unwrap_or(DEFAULT_REMOTE_IP);
        let fields = [
            ("secret", self.secret.expose_secret().as_str()),
            ("response", user_response),
            ("remoteip", remote_ip),
            ("sitekey", self.sitekey.as_str()),
        ];

        debug!(url = %self.verify_url, "checking captcha response");
        let http = poster.post_form(&self.verify_url, &fields).await;

        let mut success = None;
        let mut error_codes = Vec::new();
        if let Some(status) = http.status {
            if status < 400 {
                success = http
                    .json
                    .as_ref()
                    .and_then(|json| json.get("success"))
                    .and_then(Value::as_bool);
                if success != Some(true) {
                    error_codes = http
                        .json
                        .as_ref()
                        .and_then(|json| json.get("error-codes"))
                        .and_then(Value::as_array)
                        .map(|codes| {
                            codes
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    warn!(?error_codes, "captcha verification failed");
                }
            }
        }

        VerifyOutcome {
            http,
            success,
            error_codes,
        }
    }
}
