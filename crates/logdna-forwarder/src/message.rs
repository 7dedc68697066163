// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::util::unix_now;

/// A log record delivered by the host.
///
/// Field names are exposed to templates in PascalCase, so `{{.Data}}` renders
/// [`LogMessage::data`] and `{{.Container.Name}}` renders the container name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct LogMessage {
    pub container: Option<ContainerInfo>,
    /// Stream the record was read from, e.g. `stdout`.
    pub source: String,
    /// Raw text of the record.
    pub data: String,
    /// Unix seconds at which the host received the record.
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub image: String,
    pub hostname: String,
}

impl LogMessage {
    #[must_use]
    pub fn new(source: impl Into<String>, data: impl Into<String>) -> Self {
        LogMessage {
            container: None,
            source: source.into(),
            data: data.into(),
            time: unix_now(),
        }
    }

    /// Builds a message from one line of host input.
    ///
    /// A line holding a JSON object with only message fields is taken as is;
    /// anything else, including application JSON logs, becomes the `Data` of a
    /// fresh message.
    #[must_use]
    pub fn from_line(source: &str, line: &str) -> Self {
        let trimmed = line.trim_start();
        if trimmed.starts_with('{') {
            if let Ok(mut message) = serde_json::from_str::<LogMessage>(trimmed) {
                if message.source.is_empty() {
                    message.source = source.to_string();
                }
                if message.time == 0 {
                    message.time = unix_now();
                }
                return message;
            }
        }
        LogMessage::new(source, line)
    }
}
