// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The consumption loop tying formatter, batcher and forwarder together.
//!
//! ```text
//!   host ──mpsc──> LogsAdapter::stream
//!                    │  format ──(error)──> skip, count
//!                    │  append ──(threshold)──> send ──(error)──> drop, count
//!                    └─ closed / cancelled ──> ship trailing partial batch
//! ```
//!
//! Sends happen inline: while a batch is in flight no further messages are
//! read, so a slow endpoint applies backpressure to the host through the
//! bounded channel. At most one batch is in flight at any time.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::batcher::Batcher;
use crate::config::Config;
use crate::error::ForwardError;
use crate::formatter::Formatter;
use crate::forwarder::{BatchSink, Forwarder};
use crate::message::LogMessage;
use crate::payload::FormattedLine;
use crate::stats::{ForwarderStats, StatsSnapshot};

pub struct LogsAdapter<S = Forwarder> {
    formatter: Formatter,
    batcher: Batcher,
    sink: S,
    flush_interval: Option<Duration>,
    stats: Arc<ForwarderStats>,
    cancel_token: CancellationToken,
}

impl LogsAdapter<Forwarder> {
    /// Builds an adapter shipping to the HTTP intake described by `config`.
    pub fn new(config: Arc<Config>) -> Result<Self, ForwardError> {
        let forwarder = Forwarder::new(Arc::clone(&config))?;
        Ok(Self::with_sink(&config, forwarder))
    }
}

impl<S: BatchSink> LogsAdapter<S> {
    #[must_use]
    pub fn with_sink(config: &Config, sink: S) -> Self {
        LogsAdapter {
            formatter: Formatter::new(config.template.clone()),
            batcher: Batcher::new(config.batch_size),
            sink,
            flush_interval: config.flush_interval,
            stats: Arc::new(ForwarderStats::default()),
            cancel_token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ForwarderStats> {
        Arc::clone(&self.stats)
    }

    /// Cancelling stops the loop once already-queued messages are handled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Number of lines waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.batcher.len()
    }

    /// Formats and batches one message, shipping the batch if it is now full.
    ///
    /// A message the template cannot render is logged and skipped.
    pub async fn handle_message(&mut self, message: &LogMessage) {
        let line = match self.formatter.format(message) {
            Ok(line) => line,
            Err(e) => {
                warn!("LOGS | Skipping message from {:?}: {}", message.source, e);
                self.stats.record_skipped();
                return;
            }
        };
        if let Some(batch) = self.batcher.append(line) {
            self.ship(batch).await;
        }
    }

    /// Ships the pending partial batch, if any.
    pub async fn flush(&mut self) {
        if let Some(batch) = self.batcher.drain_pending() {
            self.ship(batch).await;
        }
    }

    async fn ship(&mut self, batch: Vec<FormattedLine>) {
        let lines = batch.len();
        match self.sink.send(&batch).await {
            Ok(()) => self.stats.record_delivered(lines),
            Err(e) => {
                error!("LOGS | Dropping batch of {} lines: {}", lines, e);
                self.stats.record_dropped(lines);
            }
        }
    }

    /// Consumes `rx` until it closes or the adapter is cancelled.
    ///
    /// Whatever is still batched when the loop ends is shipped before
    /// returning, so no accepted message is silently discarded.
    pub async fn stream(mut self, mut rx: mpsc::Receiver<LogMessage>) -> StatsSnapshot {
        debug!("LOGS | Adapter started");
        let cancel_token = self.cancel_token.clone();
        let mut ticker = self.flush_interval.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;
                () = cancel_token.cancelled() => {
                    debug!("LOGS | Received shutdown signal, draining queued messages");
                    loop {
                        match rx.try_recv() {
                            Ok(message) => self.handle_message(&message).await,
                            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                        }
                    }
                    break;
                }
                message = rx.recv() => match message {
                    Some(message) => self.handle_message(&message).await,
                    None => {
                        debug!("LOGS | Message channel closed");
                        break;
                    }
                },
                () = tick(&mut ticker) => {
                    if !self.batcher.is_empty() {
                        debug!("LOGS | Flush interval elapsed with {} pending lines", self.batcher.len());
                    }
                    self.flush().await;
                }
            }
        }

        self.flush().await;
        let snapshot = self.stats.snapshot();
        debug!("LOGS | Adapter stopped: {:?}", snapshot);
        snapshot
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
