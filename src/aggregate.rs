//! Accident counts, accident rates and bracket partitions.
//!
//! Everything here is a pure function of its inputs; results are built
//! fresh on every call and iterate brackets in canonical order.

use crate::accident_record::{AccidentRecord, GeoPoint};
use crate::age_bracket::AgeBracket;
use crate::error::StatsError;
use crate::license_reference::LicenseReference;
use serde::Serialize;
use rayon::prelude::*;
use std::ops::AddAssign;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BracketCounts {
    counts: [u64; AgeBracket::COUNT],
    /// Records whose age label matched no bracket.
    unmapped: u64,
}

impl BracketCounts {
    pub fn new() -> BracketCounts {
        BracketCounts::default()
    }

    pub fn get(&self, bracket: AgeBracket) -> u64 {
        self.counts[bracket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgeBracket, u64)> + '_ {
        AgeBracket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    /// Records counted into some bracket.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn unmapped(&self) -> u64 {
        self.unmapped
    }

    pub(crate) fn record(&mut self, bracket: Option<AgeBracket>) {
        match bracket {
            Some(b) => self.counts[b.index()] += 1,
            None => self.unmapped += 1,
        }
    }
}

impl AddAssign for BracketCounts {
    fn add_assign(&mut self, other: Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
        self.unmapped += other.unmapped;
    }
}

pub fn count_by_bracket(records: &[AccidentRecord]) -> BracketCounts {
    let mut counts = BracketCounts::new();
    for record in records {
        counts.record(record.bracket());
    }
    counts
}

/// Counts `chunk_size`-record partitions on the rayon pool and merges them.
/// The result equals `count_by_bracket(records)`.
pub fn count_by_bracket_partitioned(records: &[AccidentRecord], chunk_size: usize) -> BracketCounts {
    records
        .par_chunks(chunk_size.max(1))
        .map(count_by_bracket)
        .reduce(BracketCounts::new, |mut total, partial| {
            total += partial;
            total
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BracketStats {
    pub bracket: AgeBracket,
    pub accident_count: u64,
    pub license_count: u64,
    pub accident_rate_percent: f64,
}

/// Per-bracket accident count, license count and rate, in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    brackets: Vec<BracketStats>,
}

impl AggregateResult {
    pub fn get(&self, bracket: AgeBracket) -> &BracketStats {
        &self.brackets[bracket.index()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BracketStats> {
        self.brackets.iter()
    }

    pub fn total_accidents(&self) -> u64 {
        self.brackets.iter().map(|s| s.accident_count).sum()
    }
}

impl<'a> IntoIterator for &'a AggregateResult {
    type Item = &'a BracketStats;
    type IntoIter = std::slice::Iter<'a, BracketStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// `accident_rate_percent = 100 * accidents / license holders`. A zero
/// license count fails the whole computation rather than reporting a rate.
pub fn compute_rates(counts: &BracketCounts, reference: &LicenseReference) -> Result<AggregateResult, StatsError> {
    let brackets = AgeBracket::ALL
        .into_iter()
        .map(|bracket| {
            let accident_count = counts.get(bracket);
            let license_count = reference.get(bracket);
            if license_count == 0 {
                return Err(StatsError::DivisionByZero { bracket });
            }
            Ok(BracketStats {
                bracket,
                accident_count,
                license_count,
                accident_rate_percent: 100.0 * accident_count as f64 / license_count as f64,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AggregateResult { brackets })
}

/// Geolocated records split by whether their bracket is the requested one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BracketPartition<'a> {
    pub matching: Vec<&'a AccidentRecord>,
    pub others: Vec<&'a AccidentRecord>,
}

impl BracketPartition<'_> {
    pub fn matching_points(&self) -> Vec<GeoPoint> {
        self.matching.iter().filter_map(|r| r.coordinates()).collect()
    }

    pub fn other_points(&self) -> Vec<GeoPoint> {
        self.others.iter().filter_map(|r| r.coordinates()).collect()
    }
}

/// Records without both coordinates, or without a mapped bracket, land in
/// neither side.
pub fn filter_by_bracket(records: &[AccidentRecord], bracket: AgeBracket) -> BracketPartition<'_> {
    let mut partition = BracketPartition::default();
    for record in records {
        if record.coordinates().is_none() {
            continue;
        }
        match record.bracket() {
            Some(b) if b == bracket => partition.matching.push(record),
            Some(_) => partition.others.push(record),
            None => {}
        }
    }
    partition
}

/// Positions of every record that has both coordinates, whatever its label.
pub fn geolocated(records: &[AccidentRecord]) -> Vec<GeoPoint> {
    records.iter().filter_map(AccidentRecord::coordinates).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(label: &str) -> AccidentRecord {
        AccidentRecord::new(Some(33.6), Some(130.4), label)
    }

    fn mixed_records() -> Vec<AccidentRecord> {
        vec![
            rec("24歳以下"),
            rec("75歳以上"),
            rec("unknown"),
            rec("35～44"),
            AccidentRecord::new(None, Some(130.4), "75歳以上"),
            AccidentRecord::new(Some(33.6), None, "24歳以下"),
            rec("75歳以上"),
            rec(""),
        ]
    }

    #[test]
    fn counts_native_labels() {
        let records = vec![rec("24歳以下"), rec("24歳以下"), rec("75歳以上")];
        let counts = count_by_bracket(&records);
        assert_eq!(counts.get(AgeBracket::UpTo24), 2);
        assert_eq!(counts.get(AgeBracket::From75), 1);
        for b in [
            AgeBracket::From25To34,
            AgeBracket::From35To44,
            AgeBracket::From45To54,
            AgeBracket::From55To64,
            AgeBracket::From65To74,
        ] {
            assert_eq!(counts.get(b), 0);
        }
        assert_eq!(counts.unmapped(), 0);
    }

    #[test]
    fn counted_plus_unmapped_is_total() {
        let records = mixed_records();
        let counts = count_by_bracket(&records);
        assert_eq!(counts.total() + counts.unmapped(), records.len() as u64);
        assert_eq!(counts.unmapped(), 2);
    }

    #[test]
    fn counting_is_repeatable() {
        let records = mixed_records();
        assert_eq!(count_by_bracket(&records), count_by_bracket(&records));
    }

    #[test]
    fn partitioned_counts_match_sequential() {
        let mut records = Vec::new();
        for _ in 0..37 {
            records.extend(mixed_records());
        }
        let sequential = count_by_bracket(&records);
        for chunk in [0, 1, 3, 64, 1000] {
            assert_eq!(count_by_bracket_partitioned(&records, chunk), sequential);
        }
        assert_eq!(count_by_bracket_partitioned(&[], 8), BracketCounts::new());
    }

    #[test]
    fn single_record_partitions_on_large_input() {
        let records: Vec<AccidentRecord> = (0..200_000)
            .map(|i| if i % 4 == 0 { rec("unknown") } else { rec("75歳以上") })
            .collect();
        let counts = count_by_bracket_partitioned(&records, 1);
        assert_eq!(counts.total() + counts.unmapped(), 200_000);
        assert_eq!(counts.get(AgeBracket::From75), 150_000);
        assert_eq!(counts.unmapped(), 50_000);
    }

    #[test]
    fn merge_is_order_independent() {
        let records = mixed_records();
        let (left, right) = records.split_at(3);
        let mut a = count_by_bracket(left);
        a += count_by_bracket(right);
        let mut b = count_by_bracket(right);
        b += count_by_bracket(left);
        assert_eq!(a, b);
        assert_eq!(a, count_by_bracket(&records));
    }

    #[test]
    fn rates_follow_definition() {
        let records = vec![rec("24歳以下"), rec("24歳以下"), rec("75歳以上")];
        let counts = count_by_bracket(&records);
        let reference = LicenseReference::fukuoka_2021();
        let result = compute_rates(&counts, &reference).unwrap();

        for stats in &result {
            let expected = 100.0 * counts.get(stats.bracket) as f64 / reference.get(stats.bracket) as f64;
            assert_eq!(stats.accident_rate_percent, expected);
            assert_eq!(stats.license_count, reference.get(stats.bracket));
        }

        let over_75 = result.get(AgeBracket::From75);
        assert_eq!(over_75.accident_count, 1);
        assert_eq!(over_75.license_count, 219221);
        assert!((over_75.accident_rate_percent - 0.000456).abs() < 1e-6);
        assert_eq!(result.get(AgeBracket::From45To54).accident_rate_percent, 0.0);
        assert_eq!(result.total_accidents(), 3);
    }

    #[test]
    fn rates_iterate_in_canonical_order() {
        let records: Vec<AccidentRecord> = ["75歳以上", "55～64", "24歳以下", "65～74"].into_iter().map(rec).collect();
        let result = compute_rates(&count_by_bracket(&records), &LicenseReference::default()).unwrap();
        let order: Vec<AgeBracket> = result.iter().map(|s| s.bracket).collect();
        assert_eq!(order, AgeBracket::ALL.to_vec());
    }

    #[test]
    fn zero_license_count_is_reported() {
        let reference = LicenseReference::from_counts([10, 10, 10, 0, 10, 10, 10]);
        let err = compute_rates(&BracketCounts::new(), &reference).unwrap_err();
        assert_eq!(err, StatsError::DivisionByZero { bracket: AgeBracket::From45To54 });
    }

    #[test]
    fn filter_drops_missing_coordinates_and_unmapped() {
        let records = mixed_records();
        let partition = filter_by_bracket(&records, AgeBracket::From75);

        assert_eq!(partition.matching.len(), 2);
        assert_eq!(partition.others.len(), 2);
        for r in partition.matching.iter().chain(&partition.others) {
            assert!(r.latitude.is_some() && r.longitude.is_some());
            assert!(r.bracket().is_some());
        }
        assert!(partition.matching.iter().all(|r| r.bracket() == Some(AgeBracket::From75)));
        assert!(partition.others.iter().all(|r| r.bracket() != Some(AgeBracket::From75)));
        assert_eq!(partition.matching_points().len(), 2);
    }

    #[test]
    fn unknown_label_is_excluded_everywhere() {
        let records = vec![rec("unknown")];
        assert_eq!(count_by_bracket(&records).total(), 0);
        for b in AgeBracket::ALL {
            let partition = filter_by_bracket(&records, b);
            assert!(partition.matching.is_empty());
            assert!(partition.others.is_empty());
        }
    }

    #[test]
    fn geolocated_keeps_unmapped_labels() {
        assert_eq!(geolocated(&mixed_records()).len(), 6);
    }
}
