//! Envelope normalization.
//!
//! Turns whatever shape the handler was invoked with into canonical
//! content: an SNS notification's `Sns` object, the envelope itself for
//! direct invocation, or a gateway request's decoded body.

use {
    base64::Engine,
    serde_json::Value,
    std::collections::HashMap,
    tracing::{debug, warn},
};

use formgate_common::parse_lenient;

/// A normalized request: the untouched envelope, the canonical content
/// derived from it, and whether derivation failed.
///
/// Content is derived once; channels read it and never write it back.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub envelope: Value,
    pub content: Value,
    pub has_error: bool,
}

impl NormalizedRequest {
    /// Parse an invocation envelope.
    #[must_use]
    pub fn parse(envelope: Value) -> Self {
        let mut request = Self {
            content: envelope.clone(),
            envelope,
            has_error: false,
        };
        request.derive_content();
        request
    }

    fn derive_content(&mut self) {
        if let Some(sns) = sns_content(&self.envelope) {
            debug!("SNS payload extracted");
            self.content = sns;
            return;
        }

        let Some(body) = self.envelope.get("body") else {
            debug!("no body in envelope, using envelope verbatim");
            return;
        };
        self.content = body.clone();

        if self.envelope.get("isBase64Encoded").and_then(Value::as_bool) == Some(true)
            && !self.decode_base64_body()
        {
            return;
        }

        let Some(headers) = self.envelope.get("headers") else {
            debug!("no headers present, using body");
            return;
        };
        let Some(headers) = headers.as_object().filter(|map| !map.is_empty()) else {
            debug!("unexpected headers object shape");
            return;
        };

        let mut lowered = HashMap::new();
        for (key, value) in headers {
            if let Some(value) = value.as_str() {
                lowered.insert(key.to_lowercase(), value.to_lowercase());
            }
        }
        let Some(content_type) = lowered.get("content-type") else {
            debug!("no content-type header, using body");
            return;
        };

        debug!(content_type = %content_type, "content type detected");
        if content_type.starts_with("application/x-www-form-urlencoded") {
            self.parse_form_body();
        } else if content_type.starts_with("application/json") {
            self.parse_json_body();
        } else {
            warn!(content_type = %content_type, "cannot determine how to load content type");
            self.has_error = true;
        }
    }

    fn decode_base64_body(&mut self) -> bool {
        let decoded = self
            .content
            .as_str()
            .and_then(|raw| {
                base64::engine::general_purpose::STANDARD
                    .decode(raw)
                    .ok()
            })
            .and_then(|bytes| String::from_utf8(bytes).ok());
        match decoded {
            Some(text) => {
                debug!("body is base64 encoded, decoded");
                self.content = Value::String(text);
                true
            },
            None => {
                warn!("error decoding base64 body");
                self.has_error = true;
                false
            },
        }
    }

    /// Decode then parse, mirroring browser form submission: repeated keys
    /// accumulate into arrays, pairs with blank values are dropped.
    fn parse_form_body(&mut self) {
        let Some(raw) = self.content.as_str() else {
            self.has_error = true;
            return;
        };
        let Ok(decoded) = urlencoding::decode(raw) else {
            warn!("error decoding URL encoded form");
            self.has_error = true;
            return;
        };

        let mut map = serde_json::Map::new();
        for (key, value) in url::form_urlencoded::parse(decoded.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = entry {
                values.push(Value::String(value.to_string()));
            }
        }
        self.content = Value::Object(map);
    }

    fn parse_json_body(&mut self) {
        let Some(raw) = self.content.as_str() else {
            self.has_error = true;
            return;
        };
        match parse_lenient(raw) {
            Ok(value) => self.content = value,
            Err(error) => {
                warn!(error = %error, "error loading body as JSON");
                self.has_error = true;
            },
        }
    }

    /// Remote client address, when the gateway envelope carried one.
    ///
    /// Tries the v2 request-context path, then v1. Absence is not an
    /// error.
    #[must_use]
    pub fn remote_ip(&self) -> Option<String> {
        let ip = self
            .envelope
            .pointer("/requestContext/http/sourceIp")
            .or_else(|| self.envelope.pointer("/requestContext/identity/sourceIp"))
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(remote_ip = ?ip, "fetched remote IP from envelope");
        ip
    }
}

fn sns_content(envelope: &Value) -> Option<Value> {
    let record = envelope.get("Records")?.as_array()?.first()?;
    let sns = record.get("Sns")?;
    if sns.get("Message").is_some() && sns.get("Subject").is_some() {
        Some(sns.clone())
    } else {
        None
    }
}
