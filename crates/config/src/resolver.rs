//! Per-key configuration resolution across environment, parameter-store,
//! and secret-store backends.

use {
    std::{collections::HashMap, env, sync::Arc},
    tracing::{debug, warn},
};

use formgate_services::{NoopParameterStore, NoopSecretStore, ParameterStore, SecretStore};

use crate::error::ConfigError;

/// Built-in defaults for keys the environment may leave unset. Channel
/// enable flags default off so a bare environment still serves requests.
fn default_for(key: &str) -> Option<&'static str> {
    match key {
        "REQUIRED_FIELDS" => Some(""),
        "HCAPTCHA_ENABLE" | "SLACK_ENABLE" | "DISCORD_ENABLE" | "EMAIL_ENABLE"
        | "STORAGE_ENABLE" => Some("false"),
        "HCAPTCHA_RESPONSE_FIELD" => Some("captcha-response"),
        "HCAPTCHA_VERIFY_URL" => Some("https://hcaptcha.com/siteverify"),
        _ => None,
    }
}

/// Resolves named configuration values.
///
/// Lookup policy for a key `NAME`: the `{NAME}_SOURCE` environment
/// variable (default `env`) picks the backend. Key names are upper-cased
/// before lookup. Overrides layer on top of the process environment,
/// keeping the resolver testable without mutating process state.
pub struct ValueResolver {
    parameters: Arc<dyn ParameterStore>,
    secrets: Arc<dyn SecretStore>,
    overrides: HashMap<String, String>,
}

impl ValueResolver {
    #[must_use]
    pub fn new(parameters: Arc<dyn ParameterStore>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            parameters,
            secrets,
            overrides: HashMap::new(),
        }
    }

    /// Resolver backed only by the process environment and defaults.
    #[must_use]
    pub fn standalone() -> Self {
        Self::new(Arc::new(NoopParameterStore), Arc::new(NoopSecretStore))
    }

    /// Layer a value over the process environment.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Resolve `name` to a string value.
    pub async fn resolve(&self, name: &str) -> Result<String, ConfigError> {
        let key = name.trim().to_uppercase();
        if key.is_empty() {
            warn!("invalid configuration key name");
            return Err(ConfigError::InvalidKey);
        }

        let source = self
            .raw(&format!("{key}_SOURCE"))
            .unwrap_or_else(|| "env".to_string())
            .to_lowercase();
        debug!(key = %key, source = %source, "resolving configuration value");

        match source.as_str() {
            "env" => self.from_env(&key),
            "parameter_store" => self.from_parameter_store(&key).await,
            "secrets_manager" => self.from_secret_store(&key).await,
            _ => {
                warn!(key = %key, source = %source, "unknown configuration source");
                Err(ConfigError::UnknownSource { key, src: source })
            },
        }
    }

    /// Resolve `name` as a boolean enable flag.
    pub async fn resolve_bool(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(self.resolve(name).await?.eq_ignore_ascii_case("true"))
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    }

    fn from_env(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.raw(key).unwrap_or_default();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return match default_for(key) {
                Some(default) => {
                    debug!(key = %key, "using built-in default");
                    Ok(default.to_string())
                },
                None => Err(ConfigError::MissingEnv {
                    key: key.to_string(),
                }),
            };
        }
        Ok(trimmed.to_string())
    }

    async fn from_parameter_store(&self, key: &str) -> Result<String, ConfigError> {
        let name = self.from_env(&format!("{key}_PARAMETER_STORE_NAME"))?;
        debug!(key = %key, name = %name, "fetching parameter store value");
        match self.parameters.get_parameter(&name).await {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(ConfigError::MissingParameter { name }),
            Err(error) => {
                warn!(name = %name, error = %error, "parameter store lookup failed");
                Err(ConfigError::MissingParameter { name })
            },
        }
    }

    async fn from_secret_store(&self, key: &str) -> Result<String, ConfigError> {
        let name = self.from_env(&format!("{key}_SECRETS_MANAGER_NAME"))?;
        debug!(key = %key, name = %name, "fetching secret store value");
        match self.secrets.get_secret(&name).await {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(ConfigError::MissingSecret { name }),
            Err(error) => {
                warn!(name = %name, error = %error, "secret store lookup failed");
                Err(ConfigError::MissingSecret { name })
            },
        }
    }
}
