// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// LogDNA ingestion endpoint used when `LOGDNA_URL` is not set.
pub const DEFAULT_INGEST_URL: &str = "https://logs.logdna.com/logs/ingest";

/// Number of lines accumulated before a batch is shipped.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Renders only the raw text of a message.
pub const DEFAULT_TEMPLATE: &str = "{{.Data}}";

pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Header carrying the ingestion key.
pub const API_KEY_HEADER: &str = "apikey";

pub const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_RETRY_ATTEMPTS: u64 = 3;

pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Upper bound for a single backoff sleep.
pub const MAX_RETRY_BACKOFF_MS: u64 = 30_000;

/// Capacity of the channel between the host and the adapter loop.
pub const CHANNEL_CAPACITY: usize = 1000;
