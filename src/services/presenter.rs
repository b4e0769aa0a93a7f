// src/services/presenter.rs
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::HeatmapError;
use crate::models::{Month, Statistics, MONTHS};
use crate::services::aggregator::{
    classify_return, format_percent, ColorBucket, SignificanceRules, EMPTY_MARKER,
};
use crate::services::config::HeatmapConfig;
use crate::services::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YearFilter {
    #[default]
    All,
    Recent,
    Crisis,
}

impl YearFilter {
    pub fn includes(self, year: i32, config: &HeatmapConfig) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Recent => year >= config.recent_cutoff,
            YearFilter::Crisis => config.crisis_years.contains(&year),
        }
    }
}

impl FromStr for YearFilter {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(YearFilter::All),
            "recent" => Ok(YearFilter::Recent),
            "crisis" => Ok(YearFilter::Crisis),
            other => Err(HeatmapError::ParseFailure(format!("unknown year filter '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub month: Month,
    pub value: Option<f64>,
    pub display: String,
    pub bucket: ColorBucket,
    pub significant: bool,
    pub event_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalCell {
    pub value: Option<f64>,
    pub display: String,
    pub bucket: ColorBucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapRow {
    pub year: i32,
    pub cells: Vec<HeatmapCell>,
    pub total: TotalCell,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub bucket: ColorBucket,
    pub range: &'static str,
    pub css_class: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
}

/// Hover detail for a single present cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDetail {
    pub title: String,
    pub return_line: String,
    pub tone: Tone,
    pub significant: bool,
    pub event_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub filter: YearFilter,
    pub rows: Vec<HeatmapRow>,
    pub statistics: Statistics,
    pub summary: String,
    pub legend: Vec<LegendEntry>,
}

impl HeatmapView {
    /// Rows newest year first. Statistics always cover the whole dataset.
    pub fn build(session: &Session, filter: YearFilter, config: &HeatmapConfig) -> Self {
        let rules = config.significance_rules();
        let rows = session
            .dataset
            .iter()
            .rev()
            .filter(|(year, _)| filter.includes(*year, config))
            .map(|(year, record)| {
                let cells = MONTHS
                    .iter()
                    .map(|month| build_cell(&rules, year, *month, record.get(*month)))
                    .collect();
                let yearly = session.yearly_return(year);
                HeatmapRow {
                    year,
                    cells,
                    total: TotalCell {
                        value: yearly,
                        display: format_total(yearly),
                        bucket: classify_return(yearly),
                    },
                }
            })
            .collect();

        HeatmapView {
            filter,
            rows,
            statistics: session.statistics,
            summary: summary_line(&session.statistics),
            legend: legend(),
        }
    }
}

fn build_cell(
    rules: &SignificanceRules,
    year: i32,
    month: Month,
    value: Option<f64>,
) -> HeatmapCell {
    HeatmapCell {
        month,
        value,
        display: match value {
            Some(_) => format_percent(value),
            None => String::new(),
        },
        bucket: classify_return(value),
        significant: rules.is_significant_event(year, month, value),
        event_label: rules.marker_for(year, month).map(|m| m.label.clone()),
    }
}

fn format_total(value: Option<f64>) -> String {
    match value {
        Some(_) => format!("{}%", format_percent(value)),
        None => EMPTY_MARKER.to_string(),
    }
}

pub fn summary_line(stats: &Statistics) -> String {
    format!(
        "Best Month: {} {} ({:.2}%) | Worst Month: {} {} ({:.2}%) | Average Return: {:.2}%",
        stats.best.month,
        stats.best.year,
        stats.best.value,
        stats.worst.month,
        stats.worst.year,
        stats.worst.value,
        stats.average
    )
}

pub fn legend() -> Vec<LegendEntry> {
    ColorBucket::SCALE
        .iter()
        .map(|bucket| LegendEntry {
            bucket: *bucket,
            range: bucket.range_label(),
            css_class: bucket.css_class(),
        })
        .collect()
}

pub fn cell_detail(
    session: &Session,
    rules: &SignificanceRules,
    year: i32,
    month: Month,
) -> Option<CellDetail> {
    let value = session.dataset.value(year, month)?;
    Some(CellDetail {
        title: format!("{} {}", month, year),
        return_line: format!("Return: {:.2}%", value),
        tone: if value >= 0.0 { Tone::Positive } else { Tone::Negative },
        significant: rules.is_significant_event(year, month, Some(value)),
        event_label: rules.marker_for(year, month).map(|m| m.label.clone()),
    })
}

const YEAR_WIDTH: usize = 6;
const CELL_WIDTH: usize = 9;
const ANSI_RESET: &str = "\x1b[0m";

fn ansi_style(bucket: ColorBucket) -> &'static str {
    match bucket {
        ColorBucket::NoData => "\x1b[90m",
        ColorBucket::StrongPositive => "\x1b[97;42m",
        ColorBucket::Positive => "\x1b[30;102m",
        ColorBucket::MildPositive => "\x1b[32m",
        ColorBucket::MildNegative => "\x1b[31m",
        ColorBucket::Negative => "\x1b[30;101m",
        ColorBucket::StrongNegative => "\x1b[97;41m",
    }
}

fn paint(text: &str, bucket: ColorBucket, color: bool) -> String {
    let padded = format!("{:>width$}", text, width = CELL_WIDTH);
    if color {
        format!("{}{}{}", ansi_style(bucket), padded, ANSI_RESET)
    } else {
        padded
    }
}

/// Plain-text grid for terminals. Significant cells carry a trailing `*`.
pub fn render_text(view: &HeatmapView, color: bool) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:<width$}", "Year", width = YEAR_WIDTH);
    for month in MONTHS {
        let _ = write!(out, "{:>width$}", month.abbrev(), width = CELL_WIDTH);
    }
    let _ = writeln!(out, "{:>width$}", "Total", width = CELL_WIDTH + 1);

    for row in &view.rows {
        let _ = write!(out, "{:<width$}", row.year, width = YEAR_WIDTH);
        for cell in &row.cells {
            let text = if cell.significant {
                format!("{}*", cell.display)
            } else {
                cell.display.clone()
            };
            out.push_str(&paint(&text, cell.bucket, color));
        }
        out.push(' ');
        out.push_str(&paint(&row.total.display, row.total.bucket, color));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&view.summary);
    out.push('\n');

    out.push_str("Returns:");
    for entry in &view.legend {
        if color {
            let _ = write!(out, " {}  {} {}", ansi_style(entry.bucket), ANSI_RESET, entry.range);
        } else {
            let _ = write!(out, " [{}]", entry.range);
        }
    }
    out.push('\n');
    out
}
