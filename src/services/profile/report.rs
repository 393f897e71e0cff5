use std::fmt::Write;

use super::analyzer::TableProfiler;
use super::types::{SummaryOutcome, SummaryReport};
use crate::models::Table;

const RECOMMENDATIONS: [&str; 3] = [
    "Track the main metric over time (see the time series).",
    "Add columns such as region or product to enable segmentation.",
    "Check outliers: days with unusually low or high values.",
];

pub fn build_summary(table: &Table) -> SummaryReport {
    let profiler = TableProfiler::new(table);
    let numeric_columns: Vec<String> = table.numeric_columns().map(|c| c.name.clone()).collect();
    let missing_total = table.missing_total();
    let statistics = profiler.summary_statistics();
    let text = render_summary_text(
        table.row_count(),
        table.column_count(),
        missing_total,
        &numeric_columns,
        &statistics,
    );

    SummaryReport {
        rows: table.row_count(),
        columns: table.column_count(),
        missing_total,
        numeric_columns,
        statistics,
        text,
    }
}

/// Markdown digest of the headline counters.
pub fn render_summary_text(
    rows: usize,
    columns: usize,
    missing_total: usize,
    numeric_columns: &[String],
    statistics: &SummaryOutcome,
) -> String {
    let numeric = if numeric_columns.is_empty() {
        "none".to_string()
    } else {
        numeric_columns.join(", ")
    };

    let mut text = String::from("**Data summary**\n");
    // Writing to a String cannot fail.
    let _ = writeln!(text, "- Rows: **{}**", rows);
    let _ = writeln!(text, "- Columns: **{}**", columns);
    let _ = writeln!(text, "- Missing values total: **{}**", missing_total);
    let _ = write!(text, "- Numeric columns: **{}**", numeric);

    match statistics {
        SummaryOutcome::Ready(_) => {
            text.push_str("\n\n**Recommendations**");
            for line in RECOMMENDATIONS {
                let _ = write!(text, "\n- {}", line);
            }
        }
        SummaryOutcome::NothingToSummarize => {
            text.push_str("\n\nThe data has no numeric columns, so no metrics can be computed.");
        }
    }

    text
}
