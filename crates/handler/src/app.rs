//! The orchestrator.
//!
//! One invocation walks Configuring, Validating, and a fixed sequence of
//! Running stages; the first stage to report an error makes its response
//! the final output. Configuration failures collapse into one generic
//! message so channel internals never leak to callers.

use {
    serde_json::Value,
    std::sync::Arc,
    tracing::{debug, error},
};

use {
    formgate_channels::{
        CaptchaRunner, ChannelRunner, DiscordRunner, EmailRunner, RunOutcome, SlackRunner,
        StorageRunner, ValidationRunner,
    },
    formgate_config::{ConfigError, ValueResolver},
    formgate_gateway::ResponseBuilder,
    formgate_services::{
        Mailer, NoopMailer, NoopParameterStore, NoopRecordStore, NoopSecretStore, ParameterStore,
        RecordStore, SecretStore,
    },
};

/// External backends injected into the pipeline.
#[derive(Clone)]
pub struct Capabilities {
    pub parameters: Arc<dyn ParameterStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub mailer: Arc<dyn Mailer>,
    pub records: Arc<dyn RecordStore>,
}

impl Capabilities {
    /// All-noop capabilities: every backend reports itself unavailable.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            parameters: Arc::new(NoopParameterStore),
            secrets: Arc::new(NoopSecretStore),
            mailer: Arc::new(NoopMailer),
            records: Arc::new(NoopRecordStore),
        }
    }
}

/// Pipeline progress. `Failed` and `Succeeded` are terminal; `handle`
/// consumes the app, so a response is computed exactly once per
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Configuring,
    Validating,
    Running(&'static str),
    Succeeded,
    Failed,
}

/// Per-channel configuration status, as reported by [`App::doctor`].
#[derive(Debug)]
pub struct DoctorReport {
    pub channel: &'static str,
    pub status: DoctorStatus,
}

#[derive(Debug)]
pub enum DoctorStatus {
    Ok { enabled: bool },
    Error(ConfigError),
}

pub struct App {
    resolver: ValueResolver,
    validation: ValidationRunner,
    captcha: CaptchaRunner,
    channels: Vec<Box<dyn ChannelRunner>>,
    stage: Stage,
}

impl App {
    #[must_use]
    pub fn new(capabilities: Capabilities) -> Self {
        let resolver = ValueResolver::new(
            Arc::clone(&capabilities.parameters),
            Arc::clone(&capabilities.secrets),
        );
        Self::with_resolver(capabilities, resolver)
    }

    /// Construct with a caller-supplied resolver (tests layer overrides
    /// on top of the process environment).
    #[must_use]
    pub fn with_resolver(capabilities: Capabilities, resolver: ValueResolver) -> Self {
        let channels: Vec<Box<dyn ChannelRunner>> = vec![
            Box::new(DiscordRunner::new()),
            Box::new(StorageRunner::new(Arc::clone(&capabilities.records))),
            Box::new(EmailRunner::new(Arc::clone(&capabilities.mailer))),
            Box::new(SlackRunner::new()),
        ];
        Self {
            resolver,
            validation: ValidationRunner::new(),
            captcha: CaptchaRunner::new(),
            channels,
            stage: Stage::Idle,
        }
    }

    /// Run the full pipeline for one invocation envelope.
    ///
    /// Never fails toward the caller: every failure path is converted
    /// into a structured response shaped for the caller's protocol.
    pub async fn handle(mut self, envelope: Value) -> Value {
        let responder = ResponseBuilder::from_envelope(&envelope);

        self.advance(Stage::Configuring);
        if let Err(err) = self.configure().await {
            error!(error = %err, "error configuring services");
            self.advance(Stage::Failed);
            return responder.message("Error configuring services", 500);
        }

        self.advance(Stage::Validating);
        let request = match self.validation.run(&envelope, &responder) {
            Ok(request) => request,
            Err(response) => {
                error!("error executing validation runner");
                self.advance(Stage::Failed);
                return response;
            },
        };

        self.advance(Stage::Running(self.captcha.name()));
        if let RunOutcome::Failed { response, .. } =
            self.captcha.run(&request, &responder).await
        {
            error!("error executing hcaptcha runner");
            self.advance(Stage::Failed);
            return response;
        }

        for index in 0..self.channels.len() {
            let name = self.channels[index].name();
            self.advance(Stage::Running(name));
            if let RunOutcome::Failed { response, .. } =
                self.channels[index].run(&request, &responder).await
            {
                error!(channel = name, "error executing channel runner");
                self.advance(Stage::Failed);
                return response;
            }
        }

        self.advance(Stage::Succeeded);
        responder.message("Message received", 200)
    }

    /// Run only the configure phase, reporting every channel instead of
    /// stopping at the first failure.
    pub async fn doctor(mut self) -> Vec<DoctorReport> {
        let mut reports = Vec::new();

        let status = match self.validation.configure(&self.resolver).await {
            Ok(()) => DoctorStatus::Ok { enabled: true },
            Err(error) => DoctorStatus::Error(error),
        };
        reports.push(DoctorReport {
            channel: "validation",
            status,
        });

        let status = match self.captcha.configure(&self.resolver).await {
            Ok(()) => DoctorStatus::Ok {
                enabled: self.captcha.enabled(),
            },
            Err(error) => DoctorStatus::Error(error),
        };
        reports.push(DoctorReport {
            channel: self.captcha.name(),
            status,
        });

        for channel in &mut self.channels {
            let status = match channel.configure(&self.resolver).await {
                Ok(()) => DoctorStatus::Ok {
                    enabled: channel.enabled(),
                },
                Err(error) => DoctorStatus::Error(error),
            };
            reports.push(DoctorReport {
                channel: channel.name(),
                status,
            });
        }

        reports
    }

    async fn configure(&mut self) -> Result<(), ConfigError> {
        self.validation.configure(&self.resolver).await?;
        self.captcha.configure(&self.resolver).await?;
        for channel in &mut self.channels {
            channel.configure(&self.resolver).await?;
        }
        Ok(())
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "pipeline stage");
        self.stage = stage;
    }
}

/// Serverless entry: build a fresh pipeline and process one envelope.
pub async fn handle_event(envelope: Value, capabilities: Capabilities) -> Value {
    App::new(capabilities).handle(envelope).await
}
