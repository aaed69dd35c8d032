use crate::core::probes::ProbeSet;
use crate::core::Report;
use crate::utils::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};

pub const SECTION_DELIMITER: &str = "━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Which request produced the reports. Decides the text and JSON layout,
/// so a one-target batch still renders as a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Single,
    Batch,
}

/// 單一報告：每個探針一行 `Label: value`
pub fn render_text(report: &Report, probes: &ProbeSet) -> String {
    let mut lines = Vec::with_capacity(report.results.len() + 1);
    lines.push(format!("URL: {}", report.target));

    for result in &report.results {
        let label = probes
            .get(&result.name)
            .map(|probe| probe.label)
            .unwrap_or(result.name.as_str());
        lines.push(format!("{}: {}", label, result.value));
    }

    lines.join("\n")
}

/// Each report becomes one section, and sections are joined with the delimiter line.
pub fn render_batch_text(reports: &[Report], probes: &ProbeSet) -> String {
    reports
        .iter()
        .map(|report| format!("{}\n{}", SECTION_DELIMITER, render_text(report, probes)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Single mode emits one object, batch mode always emits an array.
pub fn render_json(reports: &[Report], mode: RenderMode) -> Result<String> {
    match (mode, reports) {
        (RenderMode::Single, [single]) => Ok(serde_json::to_string_pretty(single)?),
        (RenderMode::Single, _) => Err(single_mode_mismatch(reports.len())),
        (RenderMode::Batch, many) => Ok(serde_json::to_string_pretty(many)?),
    }
}

pub fn render_csv(reports: &[Report]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if let Some(first) = reports.first() {
        let mut header = vec!["url"];
        header.extend(first.probe_names());
        header.push("inspected_at");
        writer.write_record(&header)?;
    }

    for report in reports {
        let mut row = Vec::with_capacity(report.results.len() + 2);
        row.push(report.target.to_string());
        row.extend(report.results.iter().map(|r| r.value.to_string()));
        row.push(report.inspected_at.to_rfc3339());
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ProbeError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ProbeError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn render(
    reports: &[Report],
    mode: RenderMode,
    format: OutputFormat,
    probes: &ProbeSet,
) -> Result<String> {
    match format {
        OutputFormat::Text => match (mode, reports) {
            (RenderMode::Single, [single]) => Ok(render_text(single, probes)),
            (RenderMode::Single, _) => Err(single_mode_mismatch(reports.len())),
            (RenderMode::Batch, many) => Ok(render_batch_text(many, probes)),
        },
        OutputFormat::Json => render_json(reports, mode),
        OutputFormat::Csv => render_csv(reports),
    }
}

fn single_mode_mismatch(count: usize) -> ProbeError {
    ProbeError::validation("reports", &count.to_string(), "single mode renders exactly one report")
}
