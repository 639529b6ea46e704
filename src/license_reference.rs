use crate::age_bracket::AgeBracket;
use crate::error::StatsError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Driver's-license holders per age bracket for one reporting year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseReference {
    counts: [u64; AgeBracket::COUNT],
}

impl LicenseReference {
    /// License holders resident in Fukuoka Prefecture, 2021
    /// (National Police Agency driver's license statistics).
    pub fn fukuoka_2021() -> LicenseReference {
        LicenseReference {
            counts: [75608, 472998, 617440, 691151, 531731, 535771, 219221],
        }
    }

    /// Counts listed in canonical bracket order.
    pub fn from_counts(counts: [u64; AgeBracket::COUNT]) -> LicenseReference {
        LicenseReference { counts }
    }

    /// Builds a table keyed by bracket label (either label form). Every
    /// bracket must be given exactly once.
    pub fn from_entries(entries: &BTreeMap<String, u64>) -> Result<LicenseReference, StatsError> {
        let mut counts: [Option<u64>; AgeBracket::COUNT] = [None; AgeBracket::COUNT];
        for (label, count) in entries {
            let bracket: AgeBracket = label.parse().map_err(StatsError::Reference)?;
            let slot = &mut counts[bracket.index()];
            if slot.is_some() {
                return Err(StatsError::Reference(format!("age bracket '{}' is given twice", bracket)));
            }
            *slot = Some(*count);
        }

        let mut resolved = [0u64; AgeBracket::COUNT];
        for bracket in AgeBracket::ALL {
            resolved[bracket.index()] = counts[bracket.index()]
                .ok_or_else(|| StatsError::Reference(format!("age bracket '{}' has no license count", bracket)))?;
        }
        Ok(LicenseReference { counts: resolved })
    }

    pub fn get(&self, bracket: AgeBracket) -> u64 {
        self.counts[bracket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgeBracket, u64)> + '_ {
        AgeBracket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Default for LicenseReference {
    fn default() -> Self {
        LicenseReference::fukuoka_2021()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_matches_published_counts() {
        let reference = LicenseReference::fukuoka_2021();
        assert_eq!(reference.get(AgeBracket::UpTo24), 75608);
        assert_eq!(reference.get(AgeBracket::From45To54), 691151);
        assert_eq!(reference.get(AgeBracket::From75), 219221);
        assert_eq!(reference.total(), 3_143_920);
        let order: Vec<AgeBracket> = reference.iter().map(|(b, _)| b).collect();
        assert_eq!(order, AgeBracket::ALL.to_vec());
    }

    #[test]
    fn entries_accept_both_label_forms() {
        let entries: BTreeMap<String, u64> = [
            ("16-24", 1),
            ("25-34", 2),
            ("35-44", 3),
            ("45-54", 4),
            ("55-64", 5),
            ("65-74", 6),
            ("75 and above", 7),
        ]
        .into_iter()
        .map(|(l, c)| (l.to_string(), c))
        .collect();
        let reference = LicenseReference::from_entries(&entries).unwrap();
        assert_eq!(reference, LicenseReference::from_counts([1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn entries_must_cover_every_bracket_once() {
        let mut entries: BTreeMap<String, u64> = BTreeMap::new();
        entries.insert("16-24".into(), 1);
        assert!(matches!(LicenseReference::from_entries(&entries), Err(StatsError::Reference(_))));

        entries.insert("24 and below".into(), 1);
        assert!(matches!(LicenseReference::from_entries(&entries), Err(StatsError::Reference(_))));

        let mut unknown = BTreeMap::new();
        unknown.insert("80+".to_string(), 3);
        assert!(matches!(LicenseReference::from_entries(&unknown), Err(StatsError::Reference(_))));
    }
}
