use crate::accident_record::AccidentRecord;
use crate::age_bracket::AgeBracket;
use crate::aggregate::{compute_rates, count_by_bracket_partitioned, geolocated, AggregateResult};
use crate::chart::{accident_count_chart, accident_rate_chart, highlight_map, location_map, severe_share_chart, BarChart, MapView};
use crate::error::StatsError;
use crate::license_reference::LicenseReference;
use crate::severity::{severe_composition, SevereComposition, SeverityRule};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub records: u64,
    pub geolocated: u64,
    pub unmapped: u64,
}

/// Records counted per rayon task.
const PARTITION_SIZE: usize = 8192;

/// Everything the dashboard page shows, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub dataset: DatasetSummary,
    pub reference: LicenseReference,
    pub aggregate: AggregateResult,
    pub severe: SevereComposition,
    pub accident_count_chart: BarChart,
    pub accident_rate_chart: BarChart,
    pub severe_share_chart: BarChart,
    pub location_map: MapView,
    pub highlight_map: MapView,
}

impl DashboardReport {
    pub fn build(
        records: &[AccidentRecord],
        reference: &LicenseReference,
        highlight: AgeBracket,
        severity: &SeverityRule,
    ) -> Result<DashboardReport, StatsError> {
        let counts = count_by_bracket_partitioned(records, PARTITION_SIZE);
        if counts.unmapped() > 0 {
            warn!("{} record(s) with an unrecognised age label were left out of the counts", counts.unmapped());
        }
        let aggregate = compute_rates(&counts, reference)?;
        let severe = severe_composition(records, severity);
        debug!("{} fatal accident(s) with a known age bracket", severe.total);

        Ok(DashboardReport {
            dataset: DatasetSummary {
                records: records.len() as u64,
                geolocated: geolocated(records).len() as u64,
                unmapped: counts.unmapped(),
            },
            reference: reference.clone(),
            accident_count_chart: accident_count_chart(&aggregate),
            accident_rate_chart: accident_rate_chart(&aggregate),
            severe_share_chart: severe_share_chart(&severe),
            location_map: location_map(records),
            highlight_map: highlight_map(records, highlight),
            aggregate,
            severe,
        })
    }
}

/// Fixed-width table of counts and rates, one line per bracket.
pub fn render_summary(result: &AggregateResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<14}{:>10}{:>17}{:>12}", "age group", "accidents", "license holders", "rate (%)");
    for s in result {
        let _ = writeln!(
            out,
            "{:<14}{:>10}{:>17}{:>12.6}",
            s.bracket.label(),
            s.accident_count,
            s.license_count,
            s.accident_rate_percent
        );
    }
    let _ = write!(out, "{:<14}{:>10}", "total", result.total_accidents());
    out
}

pub const REPORT_FILE: &str = "dashboard.json";

pub fn write_json(dir: &Path, report: &DashboardReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    let path = dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize dashboard report")?;
    fs::write(&path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
    Ok(path)
}
