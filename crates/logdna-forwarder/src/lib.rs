// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batched forwarding of log messages to a LogDNA ingestion endpoint.
//!
//! Messages flow through three stages:
//!
//! ```text
//!   LogMessage ──> Formatter ──> Batcher ──> Forwarder ──> POST /logs/ingest
//!                 (template)   (threshold)   (retry, stats)
//! ```
//!
//! [`adapter::LogsAdapter`] owns all three and drives them from a channel.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod adapter;
pub mod batcher;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod forwarder;
pub mod hostname;
pub mod http;
pub mod message;
pub mod payload;
pub mod retry;
pub mod stats;
pub mod util;
