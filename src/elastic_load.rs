use crate::accident_record::{AccidentRecord, GeoPoint};
use crate::age_bracket::AgeBracket;
use async_trait::async_trait;
use serde::Serialize;
use std::ops::AddAssign;

#[async_trait]
pub trait ElasticLoad {
    async fn load(&self, items: &[MapDocument]) -> anyhow::Result<ElasticLoadResults>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElasticLoadResults {
    pub num_total: usize,
    pub num_created: usize,
    pub num_failed: usize,
}

impl AddAssign for ElasticLoadResults {
    fn add_assign(&mut self, other: Self) {
        self.num_total += other.num_total;
        self.num_created += other.num_created;
        self.num_failed += other.num_failed;
    }
}

/// One map point. `location` serializes as an Elasticsearch `geo_point`
/// object (`{"lat": .., "lon": ..}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDocument {
    pub location: GeoPoint,
    pub age_bracket: Option<AgeBracket>,
    pub highlighted: bool,
    pub accident_kind: Option<String>,
}

/// Documents for every record with both coordinates. Records with an
/// unrecognised age label are kept, without a bracket.
pub fn map_documents(records: &[AccidentRecord], highlight: AgeBracket) -> Vec<MapDocument> {
    records
        .iter()
        .filter_map(|record| {
            let location = record.coordinates()?;
            let age_bracket = record.bracket();
            Some(MapDocument {
                location,
                age_bracket,
                highlighted: age_bracket == Some(highlight),
                accident_kind: record.accident_kind.clone(),
            })
        })
        .collect()
}
