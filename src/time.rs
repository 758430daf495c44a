// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::rng::splitmix64;

/// Timestamps are 100 ns ticks in the Windows FILETIME epoch (Jan 1 1601).
pub type Ticks = i64;

/// Ticks per second (100 ns resolution).
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Jan 1 2024 00:00:00 UTC in ticks.
pub const JAN_1_2024: u64 = 133_485_408_000_000_000;

/// Seconds between the FILETIME epoch and the Unix epoch.
const UNIX_EPOCH_OFFSET_SECONDS: u64 = 11_644_473_600;

/// Returns the current wall clock in ticks.
#[must_use]
pub fn now_ticks() -> Ticks {
    let unix = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    let seconds = unix.as_secs() + UNIX_EPOCH_OFFSET_SECONDS;
    let sub_ticks = u64::from(unix.subsec_nanos()) / 100;

    #[allow(clippy::cast_possible_wrap)]
    let ticks = (seconds.saturating_mul(TICKS_PER_SECOND).saturating_add(sub_ticks)) as Ticks;
    ticks
}

/// Returns a monotonic-ish tick count used to derive run-unique seeds.
#[must_use]
pub fn tick_count() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Base timestamp all generated nodes inherit for a given effective seed.
///
/// Jan 1 2024 plus up to 90 days, chosen by the seed.
#[must_use]
pub fn generation_base_time(effective_seed: u64) -> Ticks {
    const MAX_OFFSET_SECONDS: u64 = 60 * 60 * 24 * 90;

    let offset_seconds = splitmix64(effective_seed) % (MAX_OFFSET_SECONDS + 1);

    #[allow(clippy::cast_possible_wrap)]
    let ticks = (JAN_1_2024 + offset_seconds * TICKS_PER_SECOND) as Ticks;
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn base_time_is_deterministic_and_bounded() {
        assert_eq!(generation_base_time(42), generation_base_time(42));

        let base = generation_base_time(99) as u64;
        assert!(base >= JAN_1_2024);
        assert!(base <= JAN_1_2024 + 90 * 24 * 60 * 60 * TICKS_PER_SECOND);
    }

    #[test]
    fn now_is_after_2024() {
        assert!(now_ticks() as u64 > JAN_1_2024);
    }
}
