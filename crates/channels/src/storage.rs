//! Record storage.
//!
//! Writes the extracted fields, plus a generated id and timestamp, as a
//! single record through the injected record-store capability.

use {
    async_trait::async_trait,
    serde_json::{Value, json},
    std::sync::Arc,
    tracing::{debug, warn},
    uuid::Uuid,
};

use {
    formgate_common::split_fields,
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::{NormalizedRequest, ResponseBuilder},
    formgate_services::RecordStore,
};

use crate::runner::{ChannelRunner, NOTIFICATION_SERVICE_ERROR, RunOutcome, extract_fields};

pub struct StorageRunner {
    enabled: bool,
    table: String,
    fields: Vec<String>,
    records: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for StorageRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRunner")
            .field("enabled", &self.enabled)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl StorageRunner {
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            enabled: false,
            table: String::new(),
            fields: Vec::new(),
            records,
        }
    }
}

#[async_trait]
impl ChannelRunner for StorageRunner {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn configure(&mut self, resolver: &ValueResolver) -> Result<(), ConfigError> {
        self.enabled = resolver.resolve_bool("STORAGE_ENABLE").await?;
        debug!(enabled = self.enabled, "record storage configured");
        if !self.enabled {
            return Ok(());
        }

        self.table = resolver.resolve("STORAGE_TABLE").await?;
        self.fields = split_fields(&resolver.resolve("REQUIRED_FIELDS").await?);
        Ok(())
    }

    async fn run(&self, request: &NormalizedRequest, responder: &ResponseBuilder) -> RunOutcome {
        if !self.enabled {
            return RunOutcome::Skipped;
        }

        let mut record = match extract_fields(&self.fields, &request.content) {
            Ok(extracted) => extracted,
            Err(field) => {
                warn!(field = %field, "field extraction error");
                return RunOutcome::failed(responder.message(NOTIFICATION_SERVICE_ERROR, 500));
            },
        };
        record.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
        record.insert("timestamp".to_string(), json!(chrono::Utc::now().timestamp()));

        debug!(table = %self.table, "writing record");
        match self
            .records
            .put_record(&self.table, Value::Object(record))
            .await
        {
            Ok(ack) => RunOutcome::Completed(Some(ack)),
            Err(error) => {
                warn!(error = %error, "record saving error");
                RunOutcome::failed(responder.message("Storage service error", 500))
            },
        }
    }
}
