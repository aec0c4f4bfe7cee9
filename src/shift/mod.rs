//! Shift and period model.
//!
//! A [`Shift`] is the daily time template periods are carved from: a
//! wall-clock window, a fixed period length, and a break inserted after
//! every `break_after` periods.
//!
//! # Packing
//!
//! Periods are packed greedily from the start of the window. After every
//! N-th packed period one break is consumed. Packing stops as soon as the
//! next period would end past the window.
//!
//! Non-positive period length or cadence fall back to 60 minutes and 3
//! periods respectively; a negative break length counts as zero. A window
//! whose end is not after its start yields zero periods.

use chrono::{Duration, NaiveTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::models::ShiftId;

/// Fallback period length (minutes) for non-positive inputs.
pub const DEFAULT_PERIOD_MINUTES: i32 = 60;

/// Fallback break cadence for non-positive inputs.
pub const DEFAULT_BREAK_AFTER: i32 = 3;

/// Daily time template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shift {
    pub id: ShiftId,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Length of one period (minutes).
    pub period_minutes: i32,
    /// Length of one break (minutes).
    pub break_minutes: i32,
    /// A break follows every `break_after` periods.
    pub break_after: i32,
    /// Stored periods per day. May be stale relative to the other fields;
    /// the validator reports the mismatch. Zero means "derive it".
    pub total_periods: u32,
}

impl Shift {
    /// Creates a shift with `total_periods` derived from the other fields.
    pub fn new(
        id: ShiftId,
        start: NaiveTime,
        end: NaiveTime,
        period_minutes: i32,
        break_minutes: i32,
        break_after: i32,
    ) -> Self {
        let mut shift = Self {
            id,
            start,
            end,
            period_minutes,
            break_minutes,
            break_after,
            total_periods: 0,
        };
        shift.total_periods = total_periods(&shift);
        shift
    }

    /// Overrides the stored period count.
    pub fn with_total_periods(mut self, total_periods: u32) -> Self {
        self.total_periods = total_periods;
        self
    }

    /// Window length in minutes (negative when `end` precedes `start`).
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Stored period count, or the derived one when nothing is stored.
    pub fn periods_per_day(&self) -> u32 {
        if self.total_periods == 0 {
            total_periods(self)
        } else {
            self.total_periods
        }
    }

    fn effective_period_minutes(&self) -> i64 {
        if self.period_minutes <= 0 {
            DEFAULT_PERIOD_MINUTES as i64
        } else {
            self.period_minutes as i64
        }
    }

    fn effective_break_after(&self) -> i64 {
        if self.break_after <= 0 {
            DEFAULT_BREAK_AFTER as i64
        } else {
            self.break_after as i64
        }
    }

    fn effective_break_minutes(&self) -> i64 {
        self.break_minutes.max(0) as i64
    }
}

/// Number of periods that fit into the shift window.
pub fn total_periods(shift: &Shift) -> u32 {
    let available = shift.duration_minutes();
    if available <= 0 {
        return 0;
    }

    let duration = shift.effective_period_minutes();
    let break_after = shift.effective_break_after();
    let break_minutes = shift.effective_break_minutes();

    let mut used = 0i64;
    let mut periods = 0i64;
    while used + duration <= available {
        used += duration;
        periods += 1;
        if periods % break_after == 0 {
            used += break_minutes;
        }
    }
    periods as u32
}

/// Wall-clock `(start, end)` of the 1-based `period`.
///
/// Returns `None` for period 0 or a period beyond [`total_periods`].
pub fn period_wall_clock(shift: &Shift, period: u32) -> Option<(NaiveTime, NaiveTime)> {
    if period == 0 || period > total_periods(shift) {
        return None;
    }

    let duration = shift.effective_period_minutes();
    let break_after = shift.effective_break_after();
    let break_minutes = shift.effective_break_minutes();

    let mut offset = 0i64;
    for p in 1..period as i64 {
        offset += duration;
        if p % break_after == 0 {
            offset += break_minutes;
        }
    }

    let start = shift.start + Duration::minutes(offset);
    let end = start + Duration::minutes(duration);
    Some((start, end))
}

/// What occupies a [`PeriodSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlotKind {
    /// A teaching period (1-based number).
    Period(u32),
    /// A break between periods.
    Break,
}

/// One block of the rendered day layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeriodSlot {
    pub kind: SlotKind,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Full day layout: periods interleaved with breaks, in order.
///
/// A break is emitted only if it fits entirely in the window and is
/// followed by room for at least one more period.
pub fn period_timings(shift: &Shift) -> Vec<PeriodSlot> {
    let available = shift.duration_minutes();
    let duration = shift.effective_period_minutes();
    let break_after = shift.effective_break_after();
    let break_minutes = shift.effective_break_minutes();

    let mut slots = Vec::new();
    let mut offset = 0i64;
    let mut period = 0u32;

    while offset + duration <= available {
        if period > 0 && (period as i64) % break_after == 0 && break_minutes > 0 {
            if offset + break_minutes + duration > available {
                break;
            }
            slots.push(PeriodSlot {
                kind: SlotKind::Break,
                start: shift.start + Duration::minutes(offset),
                end: shift.start + Duration::minutes(offset + break_minutes),
            });
            offset += break_minutes;
        }

        period += 1;
        slots.push(PeriodSlot {
            kind: SlotKind::Period(period),
            start: shift.start + Duration::minutes(offset),
            end: shift.start + Duration::minutes(offset + duration),
        });
        offset += duration;
    }

    slots
}
