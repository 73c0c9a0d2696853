//! Exact-timestamp joins between a device and a baseline series.
//!
//! Timestamps are compared as instants. Nothing is rounded, snapped or
//! interpolated, so devices that sample on different clocks may share few or no
//! timestamps.

use std::collections::BTreeMap;

use time::OffsetDateTime;

/// A `(timestamp, value)` observation; `None` marks a missing reading.
pub type Observation = (OffsetDateTime, Option<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only timestamps present on both sides.
    Inner,
    /// Every timestamp from either side, then rows missing a value are dropped.
    OuterDropNulls,
}

/// One row of a join before null filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    pub timestamp: OffsetDateTime,
    pub value: Option<f64>,
    pub reference: Option<f64>,
}

/// A timestamp where both the device and the baseline have a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    pub timestamp: OffsetDateTime,
    pub value: f64,
    pub reference: f64,
}

impl AlignedPair {
    pub fn abs_error(&self) -> f64 {
        (self.value - self.reference).abs()
    }
}

/// Relational join on timestamp. Repeated timestamps produce every pairing.
///
/// Inner rows keep the order of `left`; outer rows are ordered by timestamp.
pub fn join(left: &[Observation], right: &[Observation], kind: JoinKind) -> Vec<JoinedRow> {
    let mut right_index: BTreeMap<OffsetDateTime, Vec<usize>> = BTreeMap::new();
    for (i, (t, _)) in right.iter().enumerate() {
        right_index.entry(*t).or_default().push(i);
    }

    let mut rows = Vec::new();
    let mut right_matched = vec![false; right.len()];

    for &(timestamp, value) in left {
        match right_index.get(&timestamp) {
            Some(matches) => {
                for &j in matches {
                    right_matched[j] = true;
                    rows.push(JoinedRow {
                        timestamp,
                        value,
                        reference: right[j].1,
                    });
                }
            }
            None if kind == JoinKind::OuterDropNulls => rows.push(JoinedRow {
                timestamp,
                value,
                reference: None,
            }),
            None => {}
        }
    }

    if kind == JoinKind::OuterDropNulls {
        for (&(timestamp, reference), matched) in right.iter().zip(&right_matched) {
            if !matched {
                rows.push(JoinedRow {
                    timestamp,
                    value: None,
                    reference,
                });
            }
        }
        rows.sort_by_key(|r| r.timestamp);
    }

    rows
}

/// Joins and keeps only rows where both sides have a value.
pub fn align(left: &[Observation], right: &[Observation], kind: JoinKind) -> Vec<AlignedPair> {
    join(left, right, kind)
        .into_iter()
        .filter_map(|row| {
            Some(AlignedPair {
                timestamp: row.timestamp,
                value: row.value?,
                reference: row.reference?,
            })
        })
        .collect()
}

/// Mean absolute error over aligned pairs, `None` when there are none.
pub fn mean_absolute_error(pairs: &[AlignedPair]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.iter().map(AlignedPair::abs_error).sum::<f64>() / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::{datetime, offset};

    fn at(s: i64) -> OffsetDateTime {
        datetime!(2024-05-01 10:00:00 UTC) + Duration::seconds(s)
    }

    #[test]
    fn test_inner_join_keeps_shared_timestamps() {
        let left = vec![(at(0), Some(1.0)), (at(1), Some(2.0)), (at(2), Some(3.0))];
        let right = vec![(at(1), Some(20.0)), (at(2), None), (at(3), Some(40.0))];

        let rows = join(&left, &right, JoinKind::Inner);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, at(1));
        assert_eq!(rows[1].reference, None);

        let pairs = align(&left, &right, JoinKind::Inner);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].value, 2.0);
        assert_eq!(pairs[0].reference, 20.0);
    }

    #[test]
    fn test_outer_join_then_drop_nulls_matches_inner() {
        let left = vec![(at(0), Some(1.0)), (at(2), Some(3.0)), (at(4), None)];
        let right = vec![(at(2), Some(30.0)), (at(4), Some(50.0)), (at(6), Some(70.0))];

        let rows = join(&left, &right, JoinKind::OuterDropNulls);
        let times: Vec<_> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(0), at(2), at(4), at(6)]);

        let outer = align(&left, &right, JoinKind::OuterDropNulls);
        let inner = align(&left, &right, JoinKind::Inner);
        assert_eq!(outer, inner);
        assert_eq!(outer.len(), 1);
    }

    #[test]
    fn test_no_shared_timestamps() {
        let left = vec![(at(0), Some(1.0)), (at(2), Some(1.0))];
        let right = vec![(at(1), Some(1.0)), (at(3), Some(1.0))];
        assert!(align(&left, &right, JoinKind::Inner).is_empty());
        assert!(align(&left, &right, JoinKind::OuterDropNulls).is_empty());
        assert_eq!(mean_absolute_error(&[]), None);
    }

    #[test]
    fn test_sub_second_skew_does_not_match() {
        let left = vec![(at(0), Some(1.0))];
        let right = vec![(at(0) + Duration::milliseconds(500), Some(1.0))];
        assert!(align(&left, &right, JoinKind::Inner).is_empty());
    }

    #[test]
    fn test_same_instant_in_different_offsets_matches() {
        let left = vec![(at(0), Some(1.0))];
        let right = vec![(at(0).to_offset(offset!(-7)), Some(4.0))];
        let pairs = align(&left, &right, JoinKind::Inner);
        assert_eq!(pairs.len(), 1);
        assert_eq!(mean_absolute_error(&pairs), Some(3.0));
    }

    #[test]
    fn test_duplicate_timestamps_pair_up() {
        let left = vec![(at(0), Some(1.0)), (at(0), Some(2.0))];
        let right = vec![(at(0), Some(10.0)), (at(0), Some(20.0))];
        assert_eq!(align(&left, &right, JoinKind::Inner).len(), 4);
    }

    #[test]
    fn test_mae() {
        let left = vec![(at(0), Some(102.0)), (at(1), Some(108.0)), (at(2), Some(125.0))];
        let right = vec![(at(0), Some(100.0)), (at(1), Some(110.0)), (at(2), Some(120.0))];
        let pairs = align(&left, &right, JoinKind::Inner);
        assert!((mean_absolute_error(&pairs).unwrap() - 3.0).abs() < 1e-12);
    }
}
