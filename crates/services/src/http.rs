//! HTTP POST plumbing shared by the webhook and captcha services.
//!
//! Every call returns a structured [`HttpOutcome`]; transport failures are
//! captured as an outcome with no status rather than surfacing as errors.
//! The pipeline treats a missing status, or a status above 400, as
//! failure.

use {
    reqwest::{Client, header},
    serde::Serialize,
    serde_json::Value,
    tracing::{debug, warn},
};

const USER_AGENT: &str = concat!("formgate/", env!("CARGO_PKG_VERSION"));

/// Result of one outbound POST.
///
/// `status` is `None` when the request never produced an HTTP response;
/// `json` is populated when the body decodes as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HttpOutcome {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub json: Option<Value>,
}

impl HttpOutcome {
    /// Failure per the pipeline contract: no status at all, or above 400.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status > 400,
        }
    }

    /// The outcome as a JSON value, for callers that pass raw responses
    /// on.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transport_failure() -> Self {
        Self {
            status: None,
            body: None,
            json: None,
        }
    }
}

/// JSON and form-encoded POST sender.
#[derive(Debug, Clone, Default)]
pub struct HttpPoster {
    client: Client,
}

impl HttpPoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// POST a pre-serialized JSON body.
    pub async fn post_json(&self, url: &str, body: &str) -> HttpOutcome {
        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .body(body.to_string());
        self.execute(url, request).await
    }

    /// POST form-encoded key/value pairs.
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> HttpOutcome {
        let request = self
            .client
            .post(url)
            .header(header::USER_AGENT, USER_AGENT)
            .form(fields);
        self.execute(url, request).await
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> HttpOutcome {
        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(url, error = %error, "HTTP POST failed");
                return HttpOutcome::transport_failure();
            },
        };

        let status = response.status().as_u16();
        debug!(url, status, "HTTP POST completed");

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                warn!(url, error = %error, "failed reading HTTP response body");
                return HttpOutcome {
                    status: Some(status),
                    body: None,
                    json: None,
                };
            },
        };

        let json = serde_json::from_str(&body).ok();
        HttpOutcome {
            status: Some(status),
            body: Some(body),
            json,
        }
    }
}
