#![allow(dead_code)]

//! Closed-form statements of the round's invariants, used by tests to
//! cross-check the contract's behavior against the model.

extern crate std;

use shared::RoundSchedule;

/// The schedule invariant set as one predicate.
///
/// `a0 < a1 && a1 <= r1 && r0 < r1 && a0 <= r0`
pub fn schedule_is_valid(a0: u64, a1: u64, r0: u64, r1: u64) -> bool {
    a0 < a1 && a1 <= r1 && r0 < r1 && a0 <= r0
}

/// The schedule predicate over a schedule struct.
pub fn assert_schedule_valid(s: &RoundSchedule) {
    assert!(
        schedule_is_valid(s.apps_start, s.apps_end, s.round_start, s.round_end),
        "schedule invariant violated: ({}, {}, {}, {})",
        s.apps_start,
        s.apps_end,
        s.round_start,
        s.round_end
    );
}

/// The match amount never decreases across an accepted update.
pub fn assert_match_amount_monotonic(before: i128, after: i128) {
    assert!(
        after >= before,
        "match amount decreased from {} to {}",
        before,
        after
    );
}

/// The application log only ever grows.
pub fn assert_application_log_append_only(count_before: u32, count_after: u32) {
    assert!(
        count_after >= count_before,
        "application log shrank from {} to {}",
        count_before,
        count_after
    );
}

/// The two windows are independent predicates of the same clock —
/// membership in one never implies anything about the other.
pub fn windows_at(s: &RoundSchedule, now: u64) -> (bool, bool) {
    (
        s.apps_start <= now && now < s.apps_end,
        s.round_start <= now && now < s.round_end,
    )
}
