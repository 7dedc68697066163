// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One rendered log line as it appears on the wire.
///
/// Field order is part of the wire format: `timestamp`, `line`, `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedLine {
    /// Unix seconds at which the line was rendered.
    pub timestamp: i64,
    #[serde(rename = "line")]
    pub text: String,
    /// Always empty today; the intake accepts it for per-file tagging.
    #[serde(rename = "file")]
    pub source_file: String,
}

#[derive(Serialize)]
struct LinesPayload<'a> {
    lines: &'a [FormattedLine],
}

/// Encodes a batch as `{"lines":[...]}`.
pub fn serialize_batch(lines: &[FormattedLine]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&LinesPayload { lines })
}
