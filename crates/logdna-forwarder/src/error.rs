// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors raised while compiling or rendering a line template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {position}")]
    Unclosed { position: usize },

    #[error("unsupported action {action:?} at byte {position}: only field references like {{{{.Data}}}} are allowed")]
    UnsupportedAction { action: String, position: usize },

    #[error("invalid field path {path:?} at byte {position}")]
    InvalidField { path: String, position: usize },

    #[error("field {0:?} is not present on the message")]
    MissingField(String),

    #[error("message could not be converted for rendering: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors raised while loading the forwarder configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_KEY not specified")]
    MissingApiKey,

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid RAW_FORMAT template: {0}")]
    Template(#[from] TemplateError),
}

/// Errors raised while shipping a batch to the ingestion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to serialize batch: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("API key is not a valid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("ingestion endpoint responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u64,
        #[source]
        source: Box<ForwardError>,
    },
}

impl ForwardError {
    /// Whether sending the same payload again could succeed.
    ///
    /// Timeouts and connection failures are transient, as are 429 and 5xx
    /// responses. Any other 4xx (bad key, malformed payload) is permanent, as
    /// is a request reqwest refuses to build.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_builder(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Serialization(_)
            | Self::InvalidHeader(_)
            | Self::Client(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }
}
