use thiserror::Error;

/// Configuration failures.
///
/// All of them are fatal to an invocation and collapse into one generic
/// 500 response at the pipeline boundary, so none of this detail reaches
/// callers; it is for logs and the doctor command.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration key name")]
    InvalidKey,

    #[error("missing or empty environment value for {key}")]
    MissingEnv { key: String },

    #[error("missing or empty parameter store value for {name}")]
    MissingParameter { name: String },

    #[error("missing or empty secret store value for {name}")]
    MissingSecret { name: String },

    #[error("unknown source {src} for {key}")]
    UnknownSource { key: String, src: String },

    #[error("error decoding {channel} JSON template: {detail}")]
    InvalidTemplate {
        channel: &'static str,
        detail: String,
    },
}
