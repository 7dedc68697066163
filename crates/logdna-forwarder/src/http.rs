// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;
use std::error::Error;
use tracing::error;

use crate::config::Config;

/// Builds a reqwest client with optional proxy configuration and timeout.
/// Uses rustls TLS.
pub fn build_client(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

/// Client for the forwarder. A proxy that cannot be parsed is logged and
/// skipped rather than preventing startup.
pub fn get_client(config: &Config) -> Result<reqwest::Client, Box<dyn Error>> {
    match build_client(config.proxy_https.as_deref(), config.flush_timeout) {
        Ok(client) => Ok(client),
        Err(e) if config.proxy_https.is_some() => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            build_client(None, config.flush_timeout)
        }
        Err(e) => Err(e),
    }
}
