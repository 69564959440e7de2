use thiserror::Error;

use crate::domain::error::IdentityError;
use crate::domain::state::ServiceState;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown predictor kind '{kind}' for model '{model}'")]
    UnknownPredictor { kind: String, model: String },

    #[error("failed to set up predictor for model '{model}': {reason}")]
    PredictorSetup { model: String, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Failures reported by a broker adapter.
#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    #[error("topic '{0}' already exists")]
    TopicAlreadyExists(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("topic creation failed for '{topic}': {reason}")]
    TopicCreation { topic: String, reason: String },

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("close failed: {0}")]
    Close(String),
}

/// Errors that keep a model service from reaching the `Started` state.
#[derive(Error, Debug, Clone)]
pub enum StartupError {
    #[error("cannot start from state {state}")]
    InvalidState { state: ServiceState },

    #[error("failed to provision topic '{topic}': {source}")]
    Provision {
        topic: String,
        #[source]
        source: BrokerError,
    },

    #[error("failed to connect {role}: {source}")]
    Connect {
        role: &'static str,
        #[source]
        source: BrokerError,
    },

    #[error("startup cancelled by shutdown request")]
    Cancelled,
}

/// Per-message failures. Each is recovered inside the processing loop.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("payload is not valid JSON: {reason}")]
    Decode { reason: String, preview: String },

    #[error("prediction failed: {0:#}")]
    Prediction(#[source] anyhow::Error),

    #[error("failed to encode prediction: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(#[source] BrokerError),
}

impl MessageError {
    /// Short label used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Prediction(_) => "prediction",
            Self::Encode(_) => "encode",
            Self::Publish(_) => "publish",
        }
    }
}

/// Failure to release a connection during `stop()`.
#[derive(Error, Debug, Clone)]
pub enum ShutdownError {
    #[error("failed to close consumer: {0}")]
    Consumer(#[source] BrokerError),

    #[error("failed to close producer: {0}")]
    Producer(#[source] BrokerError),
}

/// Errors returned from `process()` before the loop could begin.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("cannot process from state {state}")]
    InvalidState { state: ServiceState },

    #[error("service is missing its {0} connection")]
    NotConnected(&'static str),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{failed} of {total} model services failed to start")]
    StartupFailed { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
