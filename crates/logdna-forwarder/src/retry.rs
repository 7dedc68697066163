// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::constants::MAX_RETRY_BACKOFF_MS;

/// How many times a batch is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// `attempts`, no delay.
    Immediate(u64),
    /// `attempts`, fixed delay in milliseconds.
    LinearBackoff(u64, u64),
    /// `attempts`, base delay in milliseconds doubled after every failure.
    ExponentialBackoff(u64, u64),
}

impl RetryStrategy {
    /// Total attempts including the first one; never less than 1.
    #[must_use]
    pub fn max_attempts(&self) -> u64 {
        match *self {
            Self::Immediate(attempts)
            | Self::LinearBackoff(attempts, _)
            | Self::ExponentialBackoff(attempts, _) => attempts.max(1),
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u64) -> Duration {
        let millis = match *self {
            Self::Immediate(_) => 0,
            Self::LinearBackoff(_, delay) => delay,
            Self::ExponentialBackoff(_, base) => {
                let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(2_u64.saturating_pow(exponent))
            }
        };
        Duration::from_millis(millis.min(MAX_RETRY_BACKOFF_MS))
    }
}
