// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, io, process, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use logdna_forwarder::{
    adapter::LogsAdapter, config::Config, constants::CHANNEL_CAPACITY, message::LogMessage,
};

const STDIN_SOURCE: &str = "stdin";

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on logdna relay startup: {e}");
            process::exit(1);
        }
    };
    debug!("Using config {:?}", config);

    let adapter = match LogsAdapter::new(Arc::clone(&config)) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Error creating log forwarder: {e}");
            process::exit(1);
        }
    };
    let cancel_token = adapter.cancel_token();

    let (tx, rx) = mpsc::channel::<LogMessage>(CHANNEL_CAPACITY);
    let pipeline = tokio::spawn(adapter.stream(rx));

    tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, flushing pending logs");
            cancel_token.cancel();
        }
    });

    info!(
        "Forwarding stdin to {} as {} in batches of {}",
        config.ingest_url, config.hostname, config.batch_size
    );

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            line = read_line(&mut stdin, &mut buf) => match line {
                Ok(Some(line)) => {
                    if tx.send(LogMessage::from_line(STDIN_SOURCE, &line)).await.is_err() {
                        debug!("Pipeline stopped accepting messages");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Reached end of input");
                    break;
                }
                Err(e) => {
                    error!("Error reading from stdin: {e}");
                    break;
                }
            },
        }
    }
    drop(tx);

    match pipeline.await {
        Ok(stats) => info!(
            "Shipped {} lines in {} batches, dropped {} lines in {} batches, skipped {} messages",
            stats.lines_sent,
            stats.batches_sent,
            stats.lines_dropped,
            stats.batches_dropped,
            stats.messages_skipped
        ),
        Err(e) => {
            error!("Log pipeline task failed: {e}");
            process::exit(1);
        }
    }
}

/// Reads one line without its terminator. Bytes that are not valid UTF-8 are
/// replaced rather than failing the read, so one bad line never stops input.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    let line = String::from_utf8_lossy(buf);
    if let std::borrow::Cow::Owned(_) = line {
        debug!("Replaced invalid UTF-8 in input line");
    }
    Ok(Some(line.into_owned()))
}
