//! Linear vesting math
//!
//! Pure functions of (schedule, now): no side effects, deterministic across
//! repeated calls within the same instant. A disabled schedule means 100% of
//! the allocation is immediately claimable.

use serde::{Deserialize, Serialize};

use crate::amount::BaseAmount;

/// Linear time-based release curve for one escrow room.
///
/// Invariant: `end >= start`. When `enabled` is false the remaining fields
/// are ignored and the full allocation is treated as vested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VestingSchedule {
    pub enabled: bool,
    /// Vesting start (Unix timestamp, seconds)
    pub start: u64,
    /// Vesting end (Unix timestamp, seconds)
    pub end: u64,
    /// Total amount subject to the vesting curve (base units)
    pub total_vested_eligible: BaseAmount,
}

/// Snapshot of a schedule evaluated at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VestingStatus {
    /// Amount vested so far (base units, floor of total * progress)
    pub vested: BaseAmount,
    /// Progress through the schedule, clamped to [0, 1]
    pub progress: f64,
    /// Seconds until fully vested (0 once past `end`)
    pub remaining_secs: u64,
}

impl VestingStatus {
    /// Status for a room without vesting: everything immediately available.
    pub fn fully_vested(total: BaseAmount) -> Self {
        Self {
            vested: total,
            progress: 1.0,
            remaining_secs: 0,
        }
    }
}

/// Evaluates a vesting schedule at `now`.
///
/// Before `start` nothing is vested; at or after `end` everything is vested
/// regardless of how far past `end` the clock is. In between, the vested
/// amount grows linearly and is floored to an integer base-unit amount, so it
/// is non-decreasing in `now` and never exceeds `total_vested_eligible`.
pub fn vesting_status(schedule: &VestingSchedule, now: u64) -> VestingStatus {
    if !schedule.enabled {
        return VestingStatus::fully_vested(schedule.total_vested_eligible);
    }

    // End first: an instant schedule (start == end) is fully vested at its
    // boundary, not stuck at zero.
    if now >= schedule.end {
        return VestingStatus {
            vested: schedule.total_vested_eligible,
            progress: 1.0,
            remaining_secs: 0,
        };
    }

    if now <= schedule.start {
        return VestingStatus {
            vested: BaseAmount::ZERO,
            progress: 0.0,
            remaining_secs: schedule.end.saturating_sub(now),
        };
    }

    // start < now < end here, so the duration is nonzero.
    let elapsed = (now - schedule.start) as u128;
    let duration = (schedule.end - schedule.start) as u128;
    let total = schedule.total_vested_eligible.value();

    // Quotient/remainder split keeps the floor exact without overflowing
    // total * elapsed for extreme totals.
    let vested = (total / duration) * elapsed + (total % duration) * elapsed / duration;

    VestingStatus {
        vested: BaseAmount(vested),
        progress: elapsed as f64 / duration as f64,
        remaining_secs: schedule.end - now,
    }
}
