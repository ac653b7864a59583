//! Financial report and chart payloads.
//!
//! These types mirror the JSON schema the report generator asks the model to
//! constrain its output to: a markdown `reportText` plus optional chart
//! datasets. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Labels plus one numeric series, used for both bar and pie charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesData {
    /// Category names (e.g. expense categories)
    pub labels: Vec<String>,

    /// The amount for each label, as plain floating-point values.
    /// No currency-precision guarantees beyond what the model returns.
    pub data: Vec<f64>,
}

/// One named series of a line chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Series name (e.g. "Revenue", "Expenses")
    pub label: String,

    /// One data point per time-period label
    pub data: Vec<f64>,
}

/// Labels (time periods) plus named series for a line chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendData {
    pub labels: Vec<String>,
    pub datasets: Vec<TrendSeries>,
}

/// Chart data attached to a generated report.
///
/// Produced once per report and immutable afterwards. Every dataset is
/// optional; the model may omit any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_breakdown: Option<SeriesData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_pie_chart: Option<SeriesData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_analysis: Option<TrendData>,
}

/// A parsed, validated report returned by the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    /// The full report formatted in markdown
    pub report_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<ChartData>,
}
