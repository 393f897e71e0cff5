use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use smallvec::smallvec;

use super::types::*;
use super::utils::*;
use crate::error::AppError;
use crate::models::{Column, ColumnData, Table};

/// Read-only view over one loaded table. Every method is a pure function of
/// the table (and, for the time series, the caller's metric selection).
pub struct TableProfiler<'a> {
    table: &'a Table,
}

impl<'a> TableProfiler<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    pub fn report(&self) -> TableReport {
        TableReport {
            overview: self.overview(),
            profile: self.profile_columns(),
            kpis: self.numeric_kpis(),
        }
    }

    pub fn overview(&self) -> DatasetOverview {
        let columns = self.table.columns();
        let preview = (0..self.table.row_count().min(PREVIEW_ROWS))
            .map(|row| columns.iter().map(|c| c.data.json_value(row)).collect())
            .collect();

        DatasetOverview {
            rows: self.table.row_count(),
            columns: self.table.column_count(),
            missing_total: self.table.missing_total(),
            column_names: columns.iter().map(|c| c.name.clone()).collect(),
            preview,
        }
    }

    /// One profile row per column, in column order.
    pub fn profile_columns(&self) -> Vec<ColumnProfile> {
        let rows = self.table.row_count();
        self.table
            .columns()
            .iter()
            .map(|column| self.analyze_column(column, rows))
            .collect()
    }

    fn analyze_column(&self, column: &Column, rows: usize) -> ColumnProfile {
        let missing = column.data.missing_count();
        let unique = match &column.data {
            ColumnData::Numeric(values) => values
                .iter()
                .flatten()
                .map(|v| float_key(*v))
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Text(values) => values
                .iter()
                .flatten()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::DateTime(values) => values.iter().flatten().collect::<HashSet<_>>().len(),
        };
        let example = (0..rows)
            .find_map(|row| column.data.display(row))
            .map(|s| truncate_chars(&s, EXAMPLE_MAX_CHARS))
            .unwrap_or_default();

        ColumnProfile {
            column: column.name.clone(),
            dtype: column.kind(),
            missing,
            missing_pct: percentage(missing, rows),
            unique,
            example,
        }
    }

    pub fn numeric_kpis(&self) -> NumericKpis {
        let numeric_columns = self.table.numeric_columns().count();
        if numeric_columns == 0 {
            return NumericKpis::new();
        }

        let missing_cells: usize = self
            .table
            .numeric_columns()
            .map(|c| c.data.missing_count())
            .sum();
        let total_cells = numeric_columns * self.table.row_count();

        smallvec![
            KpiRow {
                metric: "Numeric columns",
                value: KpiValue::Count(numeric_columns),
            },
            KpiRow {
                metric: "Numeric missing cells",
                value: KpiValue::Count(missing_cells),
            },
            KpiRow {
                metric: "Numeric missing %",
                value: KpiValue::Percent(percentage(missing_cells, total_cells)),
            },
        ]
    }

    /// First date-like column (in column order) with at least one parsed cell.
    pub fn date_column(&self) -> Option<(&'a Column, Cow<'a, [Option<NaiveDateTime>]>)> {
        self.table
            .columns()
            .iter()
            .filter(|c| is_date_like_name(&c.name))
            .find_map(|column| {
                let parsed = parsed_dates(column);
                parsed.iter().any(Option::is_some).then_some((column, parsed))
            })
    }

    pub fn time_series(&self, metric: Option<&str>) -> Result<TimeSeriesOutcome, AppError> {
        let selected = match metric {
            Some(name) => {
                let column = self.table.column(name).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unknown metric column: {}", name))
                })?;
                if column.as_numeric().is_none() {
                    return Err(AppError::InvalidInput(format!(
                        "Metric column {} is not numeric",
                        name
                    )));
                }
                Some(column)
            }
            None => self.table.numeric_columns().next(),
        };

        let Some((date_column, dates)) = self.date_column() else {
            tracing::debug!("No usable date column for the time series");
            return Ok(TimeSeriesOutcome::NoDateColumn);
        };
        let Some(metric_column) = selected else {
            return Ok(TimeSeriesOutcome::NoNumericColumn);
        };
        let values = metric_column.as_numeric().unwrap_or_default();

        let mut groups: BTreeMap<_, f64> = BTreeMap::new();
        for (date, value) in dates.iter().zip(values) {
            let Some(date) = date else { continue };
            let sum = groups.entry(date.date()).or_insert(0.0);
            if let Some(v) = value {
                *sum += v;
            }
        }

        if groups.is_empty() {
            return Ok(TimeSeriesOutcome::NoPlottableData {
                date_column: date_column.name.clone(),
                metric_column: metric_column.name.clone(),
            });
        }

        tracing::debug!(
            "Aggregated {} by day of {} into {} points",
            metric_column.name,
            date_column.name,
            groups.len()
        );

        Ok(TimeSeriesOutcome::Ready(TimeSeries {
            date_column: date_column.name.clone(),
            metric_column: metric_column.name.clone(),
            points: groups
                .into_iter()
                .map(|(day, value)| TimeSeriesPoint { day, value })
                .collect(),
        }))
    }

    pub fn summary_statistics(&self) -> SummaryOutcome {
        let rows: Vec<SummaryStatistics> = self
            .table
            .numeric_columns()
            .filter_map(|column| Some(describe(&column.name, column.as_numeric()?)))
            .collect();

        if rows.is_empty() {
            SummaryOutcome::NothingToSummarize
        } else {
            SummaryOutcome::Ready(rows)
        }
    }
}

/// Date cells of a candidate column. Text columns are parsed on the fly so a
/// table built without load-time coercion still yields its dates.
fn parsed_dates(column: &Column) -> Cow<'_, [Option<NaiveDateTime>]> {
    if let Some(values) = column.as_datetime() {
        return Cow::Borrowed(values);
    }
    match &column.data {
        ColumnData::Text(values) => Cow::Owned(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_datetime))
                .collect(),
        ),
        _ => Cow::Owned(vec![None; column.data.len()]),
    }
}

fn describe(name: &str, values: &[Option<f64>]) -> SummaryStatistics {
    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.iter().flatten() {
        count += 1;
        sum += v;
        min = min.min(*v);
        max = max.max(*v);
    }

    if count == 0 {
        return SummaryStatistics {
            column: name.to_string(),
            sum: None,
            mean: None,
            min: None,
            max: None,
        };
    }

    SummaryStatistics {
        column: name.to_string(),
        sum: Some(sum),
        mean: Some(sum / count as f64),
        min: Some(min),
        max: Some(max),
    }
}
