// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname detection utilities

use tracing::warn;

/// Resolves the hostname reported with every batch.
///
/// Order of precedence:
/// 1. `explicit` (from `LOGDNA_HOSTNAME`)
/// 2. `from_env` (from `HOSTNAME`)
/// 3. the system hostname
/// 4. `"unknown"`
///
/// Empty values are skipped.
#[must_use]
pub fn resolve_hostname(explicit: Option<String>, from_env: Option<String>) -> String {
    if let Some(hostname) = explicit.into_iter().chain(from_env).find(|h| !h.is_empty()) {
        return hostname;
    }
    if let Some(hostname) = system_hostname() {
        return hostname;
    }
    warn!("Could not determine hostname, using 'unknown'");
    "unknown".to_string()
}

#[cfg(unix)]
fn system_hostname() -> Option<String> {
    match nix::unistd::gethostname() {
        Ok(hostname) => hostname
            .into_string()
            .ok()
            .filter(|hostname| !hostname.is_empty()),
        Err(e) => {
            warn!("Failed to get system hostname: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn system_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_hostname_wins() {
        let hostname = resolve_hostname(
            Some("override-host".to_string()),
            Some("env-host".to_string()),
        );
        assert_eq!(hostname, "override-host");
    }

    #[test]
    fn test_env_hostname_used_when_no_override() {
        let hostname = resolve_hostname(None, Some("env-host".to_string()));
        assert_eq!(hostname, "env-host");
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let hostname = resolve_hostname(Some(String::new()), Some("env-host".to_string()));
        assert_eq!(hostname, "env-host");
    }

    #[test]
    fn test_falls_back_to_system_hostname() {
        let hostname = resolve_hostname(None, None);
        assert!(!hostname.is_empty());
    }
}
