use crate::accident_record::AccidentRecord;
use crate::age_bracket::AgeBracket;
use crate::aggregate::BracketCounts;
use serde::{Deserialize, Serialize};

/// Which `accident_kind` value marks a fatal accident.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeverityRule {
    pub fatal_value: String,
}

impl Default for SeverityRule {
    fn default() -> Self {
        SeverityRule { fatal_value: String::from("死亡") }
    }
}

impl SeverityRule {
    pub fn is_fatal(&self, record: &AccidentRecord) -> bool {
        record.accident_kind.as_deref() == Some(self.fatal_value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SevereShare {
    pub bracket: AgeBracket,
    pub fatal_count: u64,
    pub share_percent: f64,
}

/// Age composition of fatal accidents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SevereComposition {
    pub total: u64,
    pub unmapped: u64,
    pub shares: Vec<SevereShare>,
}

impl SevereComposition {
    pub fn get(&self, bracket: AgeBracket) -> &SevereShare {
        &self.shares[bracket.index()]
    }

    /// Combined share of `bracket` and every older bracket.
    pub fn share_at_or_above(&self, bracket: AgeBracket) -> f64 {
        self.shares[bracket.index()..].iter().map(|s| s.share_percent).sum()
    }
}

/// Shares are taken over fatal accidents with a mapped bracket; with no such
/// accidents every share is zero.
pub fn severe_composition(records: &[AccidentRecord], rule: &SeverityRule) -> SevereComposition {
    let mut counts = BracketCounts::new();
    for record in records.iter().filter(|r| rule.is_fatal(r)) {
        counts.record(record.bracket());
    }
    let total = counts.total();

    let shares = counts
        .iter()
        .map(|(bracket, fatal_count)| SevereShare {
            bracket,
            fatal_count,
            share_percent: if total == 0 { 0.0 } else { 100.0 * fatal_count as f64 / total as f64 },
        })
        .collect();

    SevereComposition {
        total,
        unmapped: counts.unmapped(),
        shares,
    }
}
