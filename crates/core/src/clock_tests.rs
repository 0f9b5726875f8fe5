// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

use super::*;

#[test]
fn fake_clock_advances_both_timelines() {
    let clock = FakeClock::new();
    let start_instant = clock.now();
    let start_utc = clock.utc_now();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now() - start_instant, Duration::from_secs(5));
    assert_eq!(clock.utc_now() - start_utc, chrono::Duration::seconds(5));
}

#[test]
fn fake_clock_set_utc_does_not_move_monotonic() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.set_utc(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(1));
    assert_eq!(clock.now(), before);
}
