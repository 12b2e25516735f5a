//! Response shaping for the caller's invocation protocol.
//!
//! <https://docs.aws.amazon.com/apigateway/latest/developerguide/http-api-develop-integrations-lambda.html>

use {
    serde_json::{Value, json},
    tracing::{debug, warn},
};

/// Invocation protocol, derived from the envelope's `version` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    V1,
    V2,
    /// Not a gateway invocation; responses use the flat shape.
    Unknown,
}

/// Optional overrides for gateway-shaped responses.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub is_base64_encoded: bool,
    pub headers: Option<Value>,
    pub multi_value_headers: Option<Value>,
}

/// Builds responses shaped for however the handler was invoked.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    protocol: Protocol,
}

impl ResponseBuilder {
    /// Classify the invocation protocol from the raw envelope.
    #[must_use]
    pub fn from_envelope(envelope: &Value) -> Self {
        let protocol = match envelope.get("version").and_then(Value::as_str) {
            Some(version) if version.starts_with("1.") => Protocol::V1,
            Some(version) if version.starts_with("2.") => Protocol::V2,
            Some(version) => {
                warn!(version = %version, "unknown API version");
                Protocol::Unknown
            },
            None => {
                debug!("no API version in envelope");
                Protocol::Unknown
            },
        };
        Self { protocol }
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// [`build`](Self::build) with a `{"message": text}` body.
    #[must_use]
    pub fn message(&self, text: &str, status_code: u16) -> Value {
        self.build(json!({ "message": text }), status_code, BuildOptions::default())
    }

    /// Shape `body` for the caller: flat with a `statusCode` sibling for
    /// non-gateway callers, the full gateway envelope for v1/v2.
    #[must_use]
    pub fn build(&self, body: Value, status_code: u16, options: BuildOptions) -> Value {
        if self.protocol == Protocol::Unknown {
            return match body {
                Value::Object(mut map) => {
                    map.insert("statusCode".to_string(), json!(status_code));
                    Value::Object(map)
                },
                other => json!({ "body": other, "statusCode": status_code }),
            };
        }

        json!({
            "isBase64Encoded": options.is_base64_encoded,
            "statusCode": status_code,
            "headers": options
                .headers
                .unwrap_or_else(|| json!({ "content-type": "application/json" })),
            "multiValueHeaders": options.multi_value_headers.unwrap_or_else(|| json!({})),
            "body": body,
        })
    }
}
