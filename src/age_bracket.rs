use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Age bracket of the first party (当事者A) of an accident.
///
/// Variant order is the chart x-axis order; `ALL` lists them that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "24 and below")]
    UpTo24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65-74")]
    From65To74,
    #[serde(rename = "75 and above")]
    From75,
}

impl AgeBracket {
    pub const COUNT: usize = 7;

    pub const ALL: [AgeBracket; AgeBracket::COUNT] = [
        AgeBracket::UpTo24,
        AgeBracket::From25To34,
        AgeBracket::From35To44,
        AgeBracket::From45To54,
        AgeBracket::From55To64,
        AgeBracket::From65To74,
        AgeBracket::From75,
    ];

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::UpTo24 => "24 and below",
            AgeBracket::From25To34 => "25-34",
            AgeBracket::From35To44 => "35-44",
            AgeBracket::From45To54 => "45-54",
            AgeBracket::From55To64 => "55-64",
            AgeBracket::From65To74 => "65-74",
            AgeBracket::From75 => "75 and above",
        }
    }

    /// Label used by the license-holder statistics, where the youngest
    /// bracket starts at the minimum licensing age.
    pub fn license_label(self) -> &'static str {
        match self {
            AgeBracket::UpTo24 => "16-24",
            AgeBracket::From75 => "over 75",
            other => other.label(),
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBracket {
    type Err = String;

    /// Accepts either the display label or the license-statistics label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeBracket::ALL
            .into_iter()
            .find(|b| b.label() == s || b.license_label() == s)
            .ok_or_else(|| format!("unknown age bracket '{}'", s))
    }
}

/// Native labels as they appear in the `年齢（当事者A）` column.
pub const NATIVE_LABELS: [(&str, AgeBracket); AgeBracket::COUNT] = [
    ("24歳以下", AgeBracket::UpTo24),
    ("25～34", AgeBracket::From25To34),
    ("35～44", AgeBracket::From35To44),
    ("45～54", AgeBracket::From45To54),
    ("55～64", AgeBracket::From55To64),
    ("65～74", AgeBracket::From65To74),
    ("75歳以上", AgeBracket::From75),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketLookup {
    Mapped(AgeBracket),
    Unmapped,
}

impl BracketLookup {
    pub fn bracket(self) -> Option<AgeBracket> {
        match self {
            BracketLookup::Mapped(b) => Some(b),
            BracketLookup::Unmapped => None,
        }
    }
}

/// Exact-match lookup of a native label through the validated built-in
/// table. Never guesses a nearest match; if the built-in table failed
/// validation every label is unmapped (`main` refuses to start in that case).
pub fn normalize_age_bracket(label: &str) -> BracketLookup {
    match LabelTable::validated() {
        Ok(table) => table.lookup(label),
        Err(_) => BracketLookup::Unmapped,
    }
}

static BUILTIN_TABLE: OnceLock<Result<LabelTable, StatsError>> = OnceLock::new();

/// Native-label table that has been checked for completeness.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    entries: HashMap<String, AgeBracket>,
}

impl LabelTable {
    /// The built-in `NATIVE_LABELS`, validated once and shared by every
    /// lookup in the process.
    pub fn validated() -> Result<&'static LabelTable, StatsError> {
        BUILTIN_TABLE
            .get_or_init(|| LabelTable::from_entries(&NATIVE_LABELS))
            .as_ref()
            .map_err(|e| e.clone())
    }

    /// Every bracket must appear exactly once and no native label may repeat.
    pub fn from_entries(entries: &[(&str, AgeBracket)]) -> Result<LabelTable, StatsError> {
        let mut seen_labels = HashSet::new();
        let mut seen_brackets = HashSet::new();
        for (label, bracket) in entries {
            if !seen_labels.insert(*label) {
                return Err(StatsError::LabelTable(format!("native label '{}' is listed twice", label)));
            }
            if !seen_brackets.insert(*bracket) {
                return Err(StatsError::LabelTable(format!("age bracket '{}' is mapped twice", bracket)));
            }
        }
        if let Some(missing) = AgeBracket::ALL.iter().find(|b| !seen_brackets.contains(*b)) {
            return Err(StatsError::LabelTable(format!("age bracket '{}' has no native label", missing)));
        }
        Ok(LabelTable {
            entries: entries.iter().map(|(l, b)| (l.to_string(), *b)).collect(),
        })
    }

    pub fn lookup(&self, label: &str) -> BracketLookup {
        self.entries
            .get(label)
            .map(|bracket| BracketLookup::Mapped(*bracket))
            .unwrap_or(BracketLookup::Unmapped)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_labels_map_exactly() {
        assert_eq!(normalize_age_bracket("24歳以下"), BracketLookup::Mapped(AgeBracket::UpTo24));
        assert_eq!(normalize_age_bracket("75歳以上"), BracketLookup::Mapped(AgeBracket::From75));
        assert_eq!(normalize_age_bracket("45～54"), BracketLookup::Mapped(AgeBracket::From45To54));
        // ASCII tilde and padded labels are not the native form
        assert_eq!(normalize_age_bracket("45~54"), BracketLookup::Unmapped);
        assert_eq!(normalize_age_bracket(" 24歳以下"), BracketLookup::Unmapped);
        assert_eq!(normalize_age_bracket("unknown"), BracketLookup::Unmapped);
        assert_eq!(normalize_age_bracket(""), BracketLookup::Unmapped);
    }

    #[test]
    fn canonical_order_and_labels() {
        let labels: Vec<&str> = AgeBracket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            ["24 and below", "25-34", "35-44", "45-54", "55-64", "65-74", "75 and above"]
        );
        for (i, b) in AgeBracket::ALL.iter().enumerate() {
            assert_eq!(b.index(), i);
        }
        assert_eq!(AgeBracket::UpTo24.license_label(), "16-24");
        assert_eq!(AgeBracket::From75.license_label(), "over 75");
        assert_eq!(AgeBracket::From55To64.license_label(), "55-64");
    }

    #[test]
    fn parses_either_label_form() {
        assert_eq!("75 and above".parse::<AgeBracket>(), Ok(AgeBracket::From75));
        assert_eq!("over 75".parse::<AgeBracket>(), Ok(AgeBracket::From75));
        assert_eq!("16-24".parse::<AgeBracket>(), Ok(AgeBracket::UpTo24));
        assert!("80+".parse::<AgeBracket>().is_err());
    }

    #[test]
    fn builtin_label_table_is_valid() {
        let table = LabelTable::validated().expect("built-in table");
        assert_eq!(table.len(), AgeBracket::COUNT);
        for (native, bracket) in NATIVE_LABELS {
            assert_eq!(table.lookup(native), BracketLookup::Mapped(bracket));
        }
    }

    #[test]
    fn normalization_goes_through_the_shared_table() {
        let first = LabelTable::validated().expect("built-in table");
        let second = LabelTable::validated().expect("built-in table");
        assert!(std::ptr::eq(first, second));
        for label in ["24歳以下", "35～44", "75歳以上", "unknown", ""] {
            assert_eq!(normalize_age_bracket(label), first.lookup(label));
        }
        assert!(!first.is_empty());
    }

    #[test]
    fn label_table_rejects_gaps_and_duplicates() {
        let missing = &NATIVE_LABELS[..6];
        assert!(matches!(LabelTable::from_entries(missing), Err(StatsError::LabelTable(_))));

        let mut dup_label = NATIVE_LABELS;
        dup_label[1].0 = "24歳以下";
        assert!(matches!(LabelTable::from_entries(&dup_label), Err(StatsError::LabelTable(_))));

        let mut dup_bracket = NATIVE_LABELS;
        dup_bracket[6].1 = AgeBracket::From65To74;
        assert!(matches!(LabelTable::from_entries(&dup_bracket), Err(StatsError::LabelTable(_))));
    }

    #[test]
    fn serializes_as_display_label() {
        let json = serde_json::to_string(&AgeBracket::From75).unwrap();
        assert_eq!(json, "\"75 and above\"");
        let back: AgeBracket = serde_json::from_str("\"25-34\"").unwrap();
        assert_eq!(back, AgeBracket::From25To34);
    }
}
