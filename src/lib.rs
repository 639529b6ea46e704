pub mod accident_record;
pub mod age_bracket;
pub mod aggregate;
pub mod bulk_load;
pub mod chart;
pub mod config;
pub mod elastic_load;
pub mod error;
pub mod license_reference;
pub mod report;
pub mod severity;

pub use accident_record::{AccidentRecord, ColumnMapping, GeoPoint};
pub use age_bracket::{normalize_age_bracket, AgeBracket, BracketLookup, LabelTable};
pub use aggregate::{compute_rates, count_by_bracket, filter_by_bracket, AggregateResult, BracketCounts, BracketPartition};
pub use error::StatsError;
pub use license_reference::LicenseReference;
