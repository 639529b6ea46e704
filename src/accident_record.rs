use crate::age_bracket::{normalize_age_bracket, AgeBracket};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the accident statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccidentRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub party_a_age_label: String,
    /// Accident outcome, e.g. `死亡` (fatal) or `負傷` (injury).
    pub accident_kind: Option<String>,
    /// Columns not modelled above, keyed by their source header.
    pub extra: BTreeMap<String, String>,
}

impl AccidentRecord {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, party_a_age_label: &str) -> AccidentRecord {
        AccidentRecord {
            latitude,
            longitude,
            party_a_age_label: party_a_age_label.to_string(),
            accident_kind: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> AccidentRecord {
        self.accident_kind = Some(kind.to_string());
        self
    }

    pub fn bracket(&self) -> Option<AgeBracket> {
        normalize_age_bracket(&self.party_a_age_label).bracket()
    }

    /// Both coordinates, or `None` if either is missing.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Mean position of `points`, `None` when empty.
    pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (lat_sum, lon_sum) = points
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
        Some(GeoPoint { lat: lat_sum / n, lon: lon_sum / n })
    }
}

/// Source column names for the fields the aggregation reads.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub latitude: String,
    pub longitude: String,
    pub party_a_age: String,
    pub accident_kind: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            latitude: String::from("発生場所緯度"),
            longitude: String::from("発生場所経度"),
            party_a_age: String::from("年齢（当事者A）"),
            accident_kind: String::from("事故内容"),
        }
    }
}

pub fn load_csv(path: &Path, columns: &ColumnMapping) -> Result<Vec<AccidentRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open accident CSV: {:?}", path))?;
    read_records(file, columns).with_context(|| format!("Failed to read accident CSV: {:?}", path))
}

/// Reads accident rows from any CSV source. Only the age column is required;
/// coordinates and accident kind may be absent from the header entirely.
pub fn read_records<R: Read>(reader: R, columns: &ColumnMapping) -> Result<Vec<AccidentRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let age_idx = position(&columns.party_a_age)
        .ok_or_else(|| anyhow!("Age column '{}' not found in CSV", columns.party_a_age))?;
    let lat_idx = position(&columns.latitude);
    let lon_idx = position(&columns.longitude);
    let kind_idx = position(&columns.accident_kind);
    let known = [Some(age_idx), lat_idx, lon_idx, kind_idx];

    let mut records = Vec::with_capacity(10_000);
    for result in rdr.records() {
        let row = result?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i));

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !known.contains(&Some(*i)))
            .filter_map(|(i, h)| row.get(i).map(|v| (h.clone(), v.to_string())))
            .collect();

        records.push(AccidentRecord {
            latitude: field(lat_idx).and_then(parse_coordinate),
            longitude: field(lon_idx).and_then(parse_coordinate),
            party_a_age_label: field(Some(age_idx)).unwrap_or("").to_string(),
            accident_kind: field(kind_idx).filter(|k| !k.is_empty()).map(str::to_string),
            extra,
        });
    }
    Ok(records)
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
