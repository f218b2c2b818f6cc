//! Free-time slot computation.
//!
//! Two pure functions over [`TimeInterval`] values:
//!
//! - [`free_slots`] merges a day's busy intervals into the complementary set
//!   of free gaps within the day window, dropping gaps shorter than a
//!   minimum duration.
//! - [`chunk`] partitions one free interval into a lazy sequence of
//!   contiguous fixed-length slots, discarding any short remainder.
//!
//! Both are synchronous, allocation-light, and safe to call concurrently;
//! the caller fetches busy intervals from its calendar provider before
//! either runs.

use chrono::Duration;

use crate::time::{DayWindow, SlotError, TimeInterval};

/// Computes the free gaps of a day.
///
/// `busy` may be empty, unsorted, overlapping, or touching; intervals
/// reaching outside the day window are clipped defensively. Gaps shorter
/// than `min_slot` are dropped; a `min_slot` of zero admits every
/// non-degenerate gap.
///
/// The result is a chronologically ordered sequence of mutually disjoint
/// intervals, each inside the day window, each disjoint from every busy
/// interval, each at least `min_slot` long.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDuration`] when `min_slot` is negative.
/// Malformed busy intervals cannot be represented: `end > start` is already
/// enforced by [`TimeInterval::new`] at the boundary where raw provider
/// bounds are converted.
pub fn free_slots(
    day: &DayWindow,
    busy: &[TimeInterval],
    min_slot: Duration,
) -> Result<Vec<TimeInterval>, SlotError> {
    if min_slot < Duration::zero() {
        return Err(SlotError::InvalidDuration(min_slot));
    }

    let window = day.interval();
    if busy.is_empty() {
        return Ok(vec![window]);
    }

    let mut clipped: Vec<TimeInterval> = busy.iter().filter_map(|b| b.clip(&window)).collect();
    // Ascending by start; on equal starts the shorter interval sorts first,
    // keeping the merge deterministic.
    clipped.sort_by_key(|b| (b.start(), b.end()));

    let mut free = Vec::new();
    let mut cursor = window.start();
    for b in &clipped {
        if b.start() > cursor && b.start() - cursor >= min_slot {
            free.push(TimeInterval::from_parts(cursor, b.start()));
        }
        // The cursor only moves forward; nested busy intervals never pull
        // it back and so never open a spurious gap.
        cursor = cursor.max(b.end());
    }
    if cursor < window.end() && window.end() - cursor >= min_slot {
        free.push(TimeInterval::from_parts(cursor, window.end()));
    }

    Ok(free)
}

/// Partitions `interval` into contiguous slots of exactly `slot` length.
///
/// Returns a lazy iterator; it is `Clone` and a pure function of its inputs,
/// so repeated calls (or cloned iterators) yield identical sequences. Any
/// remainder shorter than `slot` is dropped, never emitted short.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDuration`] when `slot` is not positive.
pub fn chunk(interval: &TimeInterval, slot: Duration) -> Result<SlotIter, SlotError> {
    if slot <= Duration::zero() {
        return Err(SlotError::InvalidDuration(slot));
    }
    Ok(SlotIter {
        cursor: interval.start(),
        end: interval.end(),
        slot,
    })
}

/// Lazy iterator over the fixed-length slots of one interval.
///
/// Produced by [`chunk`].
#[derive(Debug, Clone)]
pub struct SlotIter {
    cursor: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
    slot: Duration,
}

impl Iterator for SlotIter {
    type Item = TimeInterval;

    fn next(&mut self) -> Option<Self::Item> {
        let next_end = self.cursor + self.slot;
        if next_end > self.end {
            return None;
        }
        let item = TimeInterval::from_parts(self.cursor, next_end);
        self.cursor = next_end;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.cursor).num_seconds();
        let per_slot = self.slot.num_seconds();
        let n = if remaining > 0 && per_slot > 0 {
            (remaining / per_slot) as usize
        } else {
            0
        };
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day() -> DayWindow {
        DayWindow::for_date(NaiveDate::from_ymd_opt(2025, 11, 16).unwrap(), chrono_tz::UTC)
    }

    fn busy(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        TimeInterval::new(utc(2025, 11, 16, sh, sm, 0), utc(2025, 11, 16, eh, em, 0)).unwrap()
    }

    mod free_slots {
        use super::*;

        #[test]
        fn empty_busy_returns_whole_day() {
            let free = free_slots(&day(), &[], Duration::minutes(30)).unwrap();
            assert_eq!(free, vec![day().interval()]);
        }

        #[test]
        fn single_busy_splits_day() {
            let free = free_slots(&day(), &[busy(13, 0, 14, 0)], Duration::minutes(30)).unwrap();
            assert_eq!(free.len(), 2);
            assert_eq!(free[0].start(), utc(2025, 11, 16, 0, 0, 0));
            assert_eq!(free[0].end(), utc(2025, 11, 16, 13, 0, 0));
            assert_eq!(free[1].start(), utc(2025, 11, 16, 14, 0, 0));
            assert_eq!(free[1].end(), utc(2025, 11, 17, 0, 0, 0));
        }

        #[test]
        fn overlapping_busy_merges_without_artifacts() {
            // [09:00,10:00) and [09:30,11:00) must not produce a bogus
            // [10:00,09:30) gap.
            let free = free_slots(
                &day(),
                &[busy(9, 0, 10, 0), busy(9, 30, 11, 0)],
                Duration::minutes(30),
            )
            .unwrap();
            assert_eq!(free.len(), 2);
            assert_eq!(free[0].end(), utc(2025, 11, 16, 9, 0, 0));
            assert_eq!(free[1].start(), utc(2025, 11, 16, 11, 0, 0));
        }

        #[test]
        fn nested_busy_is_one_block() {
            let free = free_slots(
                &day(),
                &[busy(9, 0, 12, 0), busy(10, 0, 11, 0)],
                Duration::minutes(30),
            )
            .unwrap();
            assert_eq!(free.len(), 2);
            assert_eq!(free[0].end(), utc(2025, 11, 16, 9, 0, 0));
            assert_eq!(free[1].start(), utc(2025, 11, 16, 12, 0, 0));
        }

        #[test]
        fn unsorted_input_is_handled() {
            let free = free_slots(
                &day(),
                &[busy(15, 0, 16, 0), busy(9, 0, 10, 0)],
                Duration::minutes(30),
            )
            .unwrap();
            assert_eq!(free.len(), 3);
            assert!(free.windows(2).all(|w| w[0].end() <= w[1].start()));
        }

        #[test]
        fn busy_covering_whole_day_leaves_nothing() {
            let whole = day().interval();
            let free = free_slots(&day(), &[whole], Duration::minutes(30)).unwrap();
            assert!(free.is_empty());
        }

        #[test]
        fn short_gaps_are_dropped() {
            // 15-minute gap between the two meetings is below the minimum.
            let free = free_slots(
                &day(),
                &[busy(9, 0, 10, 0), busy(10, 15, 11, 0)],
                Duration::minutes(30),
            )
            .unwrap();
            assert_eq!(free.len(), 2);
            assert!(free.iter().all(|f| f.duration() >= Duration::minutes(30)));
        }

        #[test]
        fn zero_minimum_admits_all_gaps() {
            let free = free_slots(
                &day(),
                &[busy(9, 0, 10, 0), busy(10, 15, 11, 0)],
                Duration::zero(),
            )
            .unwrap();
            assert_eq!(free.len(), 3);
            assert_eq!(free[1].duration(), Duration::minutes(15));
        }

        #[test]
        fn negative_minimum_is_rejected() {
            let err = free_slots(&day(), &[], Duration::minutes(-1)).unwrap_err();
            assert!(matches!(err, SlotError::InvalidDuration(_)));
        }

        #[test]
        fn busy_outside_window_is_clipped() {
            let spill =
                TimeInterval::new(utc(2025, 11, 15, 22, 0, 0), utc(2025, 11, 16, 1, 0, 0))
                    .unwrap();
            let free = free_slots(&day(), &[spill], Duration::minutes(30)).unwrap();
            assert_eq!(free.len(), 1);
            assert_eq!(free[0].start(), utc(2025, 11, 16, 1, 0, 0));
            assert_eq!(free[0].end(), utc(2025, 11, 17, 0, 0, 0));
        }

        #[test]
        fn equal_starts_merge_deterministically() {
            let a = [busy(9, 0, 9, 30), busy(9, 0, 11, 0)];
            let b = [busy(9, 0, 11, 0), busy(9, 0, 9, 30)];
            let min = Duration::minutes(30);
            assert_eq!(
                free_slots(&day(), &a, min).unwrap(),
                free_slots(&day(), &b, min).unwrap()
            );
        }

        #[test]
        fn output_is_disjoint_from_busy_and_ordered() {
            let intervals = [
                busy(8, 0, 9, 30),
                busy(9, 0, 10, 0),
                busy(13, 0, 14, 0),
                busy(13, 30, 13, 45),
                busy(20, 0, 23, 59),
            ];
            let free = free_slots(&day(), &intervals, Duration::minutes(30)).unwrap();
            for f in &free {
                assert!(f.duration() >= Duration::minutes(30));
                for b in &intervals {
                    assert!(!f.overlaps(b), "{f} overlaps {b}");
                }
            }
            assert!(free.windows(2).all(|w| w[0].end() <= w[1].start()));
        }

        #[test]
        fn identical_inputs_yield_identical_output() {
            let intervals = [busy(9, 0, 10, 0), busy(14, 0, 15, 0)];
            let first = free_slots(&day(), &intervals, Duration::minutes(30)).unwrap();
            let second = free_slots(&day(), &intervals, Duration::minutes(30)).unwrap();
            assert_eq!(first, second);
        }
    }

    mod chunk {
        use super::*;

        #[test]
        fn slot_count_is_floor_of_ratio() {
            let iv = busy(9, 0, 10, 45);
            let slots: Vec<_> = chunk(&iv, Duration::minutes(30)).unwrap().collect();
            assert_eq!(slots.len(), 3);
            assert!(slots.iter().all(|s| s.duration() == Duration::minutes(30)));
        }

        #[test]
        fn slots_are_contiguous_from_interval_start() {
            let iv = busy(9, 0, 11, 0);
            let slots: Vec<_> = chunk(&iv, Duration::minutes(30)).unwrap().collect();
            assert_eq!(slots[0].start(), iv.start());
            assert!(slots.windows(2).all(|w| w[0].end() == w[1].start()));
            assert!(slots.last().unwrap().end() <= iv.end());
        }

        #[test]
        fn interval_shorter_than_slot_yields_nothing() {
            let iv = busy(9, 0, 9, 20);
            assert_eq!(chunk(&iv, Duration::minutes(30)).unwrap().count(), 0);
        }

        #[test]
        fn exact_fit_has_no_remainder() {
            let iv = busy(9, 0, 10, 0);
            let slots: Vec<_> = chunk(&iv, Duration::minutes(30)).unwrap().collect();
            assert_eq!(slots.len(), 2);
            assert_eq!(slots[1].end(), iv.end());
        }

        #[test]
        fn non_positive_duration_is_rejected() {
            let iv = busy(9, 0, 10, 0);
            assert!(matches!(
                chunk(&iv, Duration::zero()),
                Err(SlotError::InvalidDuration(_))
            ));
            assert!(matches!(
                chunk(&iv, Duration::minutes(-30)),
                Err(SlotError::InvalidDuration(_))
            ));
        }

        #[test]
        fn iterator_is_restartable() {
            let iv = busy(9, 0, 11, 0);
            let iter = chunk(&iv, Duration::minutes(30)).unwrap();
            let first: Vec<_> = iter.clone().collect();
            let second: Vec<_> = iter.collect();
            assert_eq!(first, second);
            let again: Vec<_> = chunk(&iv, Duration::minutes(30)).unwrap().collect();
            assert_eq!(first, again);
        }

        #[test]
        fn size_hint_is_exact() {
            let iv = busy(9, 0, 10, 45);
            let iter = chunk(&iv, Duration::minutes(30)).unwrap();
            assert_eq!(iter.size_hint(), (3, Some(3)));
        }
    }

    #[test]
    fn end_to_end_day_with_one_meeting() {
        // Day 2025-11-16, busy 13:00-14:00, 30-minute minimum and slots.
        let free = free_slots(&day(), &[busy(13, 0, 14, 0)], Duration::minutes(30)).unwrap();
        assert_eq!(free.len(), 2);

        let slots: Vec<_> = chunk(&free[0], Duration::minutes(30)).unwrap().collect();
        assert_eq!(slots.len(), 26);
        assert_eq!(slots[0].start(), utc(2025, 11, 16, 0, 0, 0));
        assert!(slots.windows(2).all(|w| w[0].end() == w[1].start()));
        assert_eq!(slots[25].end(), utc(2025, 11, 16, 13, 0, 0));
    }
}
