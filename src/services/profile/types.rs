use chrono::NaiveDate;
use serde::Serialize;
use smallvec::SmallVec;

use crate::models::ColumnKind;

pub const PREVIEW_ROWS: usize = 50;
pub const EXAMPLE_MAX_CHARS: usize = 50;
pub const KPI_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub dtype: ColumnKind,
    pub missing: usize,
    pub missing_pct: f64,
    pub unique: usize,
    pub example: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Count(usize),
    Percent(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    pub metric: &'static str,
    pub value: KpiValue,
}

/// Empty when the table has no numeric column.
pub type NumericKpis = SmallVec<[KpiRow; KPI_ROWS]>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub day: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub date_column: String,
    pub metric_column: String,
    pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeSeriesOutcome {
    Ready(TimeSeries),
    NoDateColumn,
    NoNumericColumn,
    /// Defensive: the chosen date column always has a parsed cell, so this
    /// is unreachable through `TableProfiler::time_series` today.
    NoPlottableData { date_column: String, metric_column: String },
}

/// Aggregates are `None` when the column has no non-missing cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub column: String,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Ready(Vec<SummaryStatistics>),
    NothingToSummarize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub missing_total: usize,
    pub column_names: Vec<String>,
    pub preview: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub rows: usize,
    pub columns: usize,
    pub missing_total: usize,
    pub numeric_columns: Vec<String>,
    pub statistics: SummaryOutcome,
    pub text: String,
}

/// Everything shown after an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub overview: DatasetOverview,
    pub profile: Vec<ColumnProfile>,
    pub kpis: NumericKpis,
}
