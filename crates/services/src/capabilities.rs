//! Capability traits for the external backends the pipeline talks to.
//!
//! Each trait has a `Noop` implementation that reports itself
//! unavailable, letting the binary run standalone before real backends
//! are wired in.

use {async_trait::async_trait, serde_json::Value, tracing::warn};

use crate::error::{ServiceError, ServiceResult};

/// Decrypting parameter-store lookup.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameter(&self, name: &str) -> ServiceResult<String>;
}

/// Secret-store lookup.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> ServiceResult<String>;
}

/// Transactional plain-text mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_text(
        &self,
        recipients: &str,
        sender: &str,
        subject: &str,
        text: &str,
    ) -> ServiceResult;
}

/// Single-record writes to a keyed table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put_record(&self, table: &str, record: Value) -> ServiceResult;
}

pub struct NoopParameterStore;

#[async_trait]
impl ParameterStore for NoopParameterStore {
    async fn get_parameter(&self, name: &str) -> ServiceResult<String> {
        warn!(name, "parameter store not wired");
        Err(ServiceError::Unavailable("parameter store"))
    }
}

pub struct NoopSecretStore;

#[async_trait]
impl SecretStore for NoopSecretStore {
    async fn get_secret(&self, name: &str) -> ServiceResult<String> {
        warn!(name, "secret store not wired");
        Err(ServiceError::Unavailable("secret store"))
    }
}

pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_text(
        &self,
        recipients: &str,
        _sender: &str,
        _subject: &str,
        _text: &str,
    ) -> ServiceResult {
        warn!(recipients, "mailer not wired");
        Err(ServiceError::Unavailable("mailer"))
    }
}

pub struct NoopRecordStore;

#[async_trait]
impl RecordStore for NoopRecordStore {
    async fn put_record(&self, table: &str, _record: Value) -> ServiceResult {
        warn!(table, "record store not wired");
        Err(ServiceError::Unavailable("record store"))
    }
}
