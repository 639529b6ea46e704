//! Chart and map values handed to whatever draws the dashboard.
//!
//! Each builder returns a self-contained value; nothing here keeps a
//! "current figure" between calls.

use crate::accident_record::{AccidentRecord, GeoPoint};
use crate::age_bracket::AgeBracket;
use crate::aggregate::{filter_by_bracket, geolocated, AggregateResult};
use crate::severity::SevereComposition;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    fn new(title: &str, x_label: &str, y_label: &str, bars: Vec<Bar>) -> BarChart {
        BarChart {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            bars,
        }
    }
}

pub fn accident_count_chart(result: &AggregateResult) -> BarChart {
    let bars = result
        .iter()
        .map(|s| Bar { label: s.bracket.label().to_string(), value: s.accident_count as f64 })
        .collect();
    BarChart::new(
        "Number of accidents by age group of parties involved",
        "Age",
        "Number of accidents",
        bars,
    )
}

pub fn accident_rate_chart(result: &AggregateResult) -> BarChart {
    let bars = result
        .iter()
        .map(|s| Bar { label: s.bracket.license_label().to_string(), value: s.accident_rate_percent })
        .collect();
    BarChart::new("Accident rates by age group", "Age group", "Accident rate (%)", bars)
}

pub fn severe_share_chart(composition: &SevereComposition) -> BarChart {
    let bars = composition
        .shares
        .iter()
        .map(|s| Bar { label: s.bracket.label().to_string(), value: s.share_percent })
        .collect();
    BarChart::new(
        "Age composition of parties involved in fatal accidents",
        "Age",
        "Share of fatal accidents (%)",
        bars,
    )
}

/// RGBA colour as used by scatter-plot map layers.
pub type Rgba = [u8; 4];

pub const OTHER_COLOR: Rgba = [255, 165, 0, 128];
pub const HIGHLIGHT_COLOR: Rgba = [200, 30, 0, 160];
const POINT_RADIUS_M: u32 = 300;
const DEFAULT_ZOOM: u8 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    pub name: String,
    pub color: Rgba,
    pub radius_m: u32,
    pub points: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// `None` when no record carries coordinates.
    pub center: Option<GeoPoint>,
    pub zoom: u8,
    pub layers: Vec<MapLayer>,
}

/// All geolocated accidents as one layer.
pub fn location_map(records: &[AccidentRecord]) -> MapView {
    let points = geolocated(records);
    MapView {
        center: GeoPoint::centroid(&points),
        zoom: DEFAULT_ZOOM,
        layers: vec![MapLayer {
            name: String::from("accidents"),
            color: OTHER_COLOR,
            radius_m: POINT_RADIUS_M,
            points,
        }],
    }
}

/// Two layers: accidents in `bracket` drawn over everyone else's.
pub fn highlight_map(records: &[AccidentRecord], bracket: AgeBracket) -> MapView {
    let partition = filter_by_bracket(records, bracket);
    MapView {
        center: GeoPoint::centroid(&geolocated(records)),
        zoom: DEFAULT_ZOOM,
        layers: vec![
            MapLayer {
                name: String::from("other"),
                color: OTHER_COLOR,
                radius_m: POINT_RADIUS_M,
                points: partition.other_points(),
            },
            MapLayer {
                name: bracket.label().to_string(),
                color: HIGHLIGHT_COLOR,
                radius_m: POINT_RADIUS_M,
                points: partition.matching_points(),
            },
        ],
    }
}
