// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Elapsed-time display formatting

/// Format a millisecond duration as `HH:MM:SS.mmm` for timing messages
pub fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_elapsed(0), "00:00:00.000");
    }

    #[test]
    fn test_format_subsecond() {
        assert_eq!(format_elapsed(42), "00:00:00.042");
    }

    #[test]
    fn test_format_full_components() {
        // 1h 02m 03s 004ms
        assert_eq!(format_elapsed(3_723_004), "01:02:03.004");
    }

    #[test]
    fn test_format_rolls_past_a_day() {
        // 25 hours stays in hours, no day component
        assert_eq!(format_elapsed(25 * 3_600_000), "25:00:00.000");
    }
}
