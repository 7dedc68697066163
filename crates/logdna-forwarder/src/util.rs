// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in whole seconds since the unix epoch.
///
/// A clock set before 1970 yields 0 rather than an error.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(unix_now() > 1_577_836_800);
    }
}
