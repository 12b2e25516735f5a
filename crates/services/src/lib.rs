//! Outbound capabilities for the formgate pipeline.
//!
//! Webhook and captcha calls go through the in-repo HTTP poster. The
//! parameter-store, secret-store, mail, and record-store backends sit
//! behind capability traits with `Noop` implementations, letting the
//! handler run standalone before real backends are wired in.

pub mod capabilities;
pub mod captcha;
pub mod error;
pub mod http;
pub mod webhook;

pub use {
    capabilities::{
        Mailer, NoopMailer, NoopParameterStore, NoopRecordStore, NoopSecretStore, ParameterStore,
        RecordStore, SecretStore,
    },
    captcha::{CaptchaVerifier, VerifyOutcome},
    error::{ServiceError, ServiceResult},
    http::{HttpOutcome, HttpPoster},
    webhook::JsonWebhook,
};
