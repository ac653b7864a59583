//! Report generator: extracted document text in, validated report out.
//!
//! Builds the fixed analyst-persona prompt around the caller's document
//! text, asks the model for output constrained to the report JSON schema,
//! and parses/validates the result. A schema-violating response fails with
//! a "malformed AI response" error and is never retried; the caller surfaces
//! it to the user instead.

use serde_json::json;

use crate::error::AppError;
use crate::models::report::{FinancialReport, SeriesData};
use crate::services::gemini::{Content, GeminiClient, GenerationConfig};

const REPORT_MODEL: &str = "gemini-1.5-flash";

const SYSTEM_INSTRUCTION: &str = "\
You are a SENIOR FINANCIAL ANALYST at Finance Guru, a premier AI-powered financial advisory firm.

Your role is to analyze uploaded financial data and generate comprehensive, professional reports. You MUST:
1. Return a valid JSON object strictly adhering to the provided schema
2. Format 'reportText' in clear, well-structured markdown with proper headings
3. ALWAYS use markdown tables for presenting numerical data
4. ALWAYS provide chart data in the 'chartData' field - this is CRITICAL for visualization
5. Be precise with all numbers - calculate percentages, ratios, and totals accurately
6. Provide actionable, data-driven insights";

const USER_INSTRUCTION_TEMPLATE: &str = "\
Analyze the provided financial data and generate a comprehensive professional report.

## REQUIRED REPORT STRUCTURE:

### 1. Executive Summary
- Total Income, Total Expenses, Net Profit/Loss
- Profit Margin percentage
- Key financial health indicators

### 2. Expense Breakdown (MUST include markdown table)
| Category | Amount | % of Total |
|----------|--------|------------|
(Include top 5-7 expense categories)

### 3. Trend Analysis
- If multi-period data: compare periods with growth/decline percentages
- Highlight significant changes (>10% variance)

### 4. SWOT Analysis
| Strengths | Weaknesses |
|-----------|------------|
| Opportunities | Threats |

### 5. Risk Assessment
- Identify 2-3 key financial risks
- Provide mitigation strategies

### 6. Recommendations
- 2-3 specific, actionable recommendations based on the data

## CRITICAL - CHART DATA REQUIREMENTS:
You MUST provide chartData with:
- **expenseBreakdown**: labels (category names) + data (amounts) for BAR chart
- **expensePieChart**: same data formatted for PIE chart
- **trendAnalysis**: If multiple periods exist, provide labels (periods) and datasets array with {label, data} objects for LINE chart

NEVER omit chartData. If data seems limited, still provide at minimum expenseBreakdown and expensePieChart.

---
FINANCIAL DATA TO ANALYZE:
";

/// JSON schema the model is asked to constrain its output to.
///
/// `reportText` is required; every chart dataset is nullable.
fn response_schema() -> serde_json::Value {
    let series = |description: &str| {
        json!({
            "type": "OBJECT",
            "description": description,
            "nullable": true,
            "properties": {
                "labels": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "The names of the expense categories."
                },
                "data": {
                    "type": "ARRAY",
                    "items": { "type": "NUMBER" },
                    "description": "The corresponding amount for each expense category."
                }
            }
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "reportText": {
                "type": "STRING",
                "description": "The full financial report formatted in markdown."
            },
            "chartData": {
                "type": "OBJECT",
                "description": "Data structured for generating charts.",
                "nullable": true,
                "properties": {
                    "expenseBreakdown": series("Data for a bar chart showing expense categories."),
                    "expensePieChart": series("Data for a pie chart showing expense proportions."),
                    "trendAnalysis": {
                        "type": "OBJECT",
                        "description": "Data for a line chart showing trends over time.",
                        "nullable": true,
                        "properties": {
                            "labels": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" },
                                "description": "The time periods (e.g., months, years)."
                            },
                            "datasets": {
                                "type": "ARRAY",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "label": { "type": "STRING" },
                                        "data": { "type": "ARRAY", "items": { "type": "NUMBER" } }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "required": ["reportText"]
    })
}

/// Generate a financial report from extracted document text.
///
/// The caller has already passed the rate-limit gate and verified the
/// content is non-empty.
///
/// # Errors
///
/// - `AiUpstream` if the completion call fails
/// - `MalformedAiResponse` if the output is not valid JSON for the schema
///   or violates the chart invariants
pub async fn generate(gemini: &GeminiClient, document_text: &str) -> Result<FinancialReport, AppError> {
    let prompt = format!("{USER_INSTRUCTION_TEMPLATE}\n\n{document_text}");

    let config = GenerationConfig {
        temperature: Some(0.2),
        top_p: Some(0.9),
        top_k: Some(30),
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(response_schema()),
        ..Default::default()
    };
    let system = Content::text(SYSTEM_INSTRUCTION);
    let contents = [Content::with_role("user", prompt)];

    let text = gemini
        .generate(REPORT_MODEL, &contents, Some(&system), Some(&config))
        .await?;

    let report: FinancialReport = serde_json::from_str(&text)
        .map_err(|e| AppError::MalformedAiResponse(format!("invalid JSON: {e}")))?;
    validate(&report)?;
    Ok(report)
}

/// Enforce the report invariants the schema alone cannot express.
///
/// `reportText` must be non-empty, and every chart dataset must have one
/// numeric value per label.
pub fn validate(report: &FinancialReport) -> Result<(), AppError> {
    if report.report_text.trim().is_empty() {
        return Err(AppError::MalformedAiResponse(
            "missing required 'reportText' field".to_string(),
        ));
    }

    if let Some(charts) = &report.chart_data {
        check_series("expenseBreakdown", charts.expense_breakdown.as_ref())?;
        check_series("expensePieChart", charts.expense_pie_chart.as_ref())?;

        if let Some(trend) = &charts.trend_analysis {
            for series in &trend.datasets {
                if series.data.len() != trend.labels.len() {
                    return Err(AppError::MalformedAiResponse(format!(
                        "trendAnalysis dataset '{}' has {} points for {} labels",
                        series.label,
                        series.data.len(),
                        trend.labels.len()
                    )));
                }
            }
        }
    }

    Ok(())
}

fn check_series(name: &str, series: Option<&SeriesData>) -> Result<(), AppError> {
    if let Some(series) = series {
        if series.labels.len() != series.data.len() {
            return Err(AppError::MalformedAiResponse(format!(
                "{name} has {} labels but {} values",
                series.labels.len(),
                series.data.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{ChartData, TrendData, TrendSeries};

    fn series(labels: &[&str], data: &[f64]) -> SeriesData {
        SeriesData {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn well_formed_payload_parses_and_validates() {
        let raw = r##"{
            "reportText": "# Financial Analysis Report\n\n## Executive Summary\n...",
            "chartData": {
                "expenseBreakdown": { "labels": ["Rent", "Payroll"], "data": [1200.0, 8400.5] },
                "expensePieChart": { "labels": ["Rent", "Payroll"], "data": [1200.0, 8400.5] }
            }
        }"##;
        let report: FinancialReport = serde_json::from_str(raw).unwrap();
        assert!(validate(&report).is_ok());
        assert!(report.report_text.starts_with("# Financial Analysis Report"));
    }

    #[test]
    fn empty_report_text_is_malformed() {
        let report = FinancialReport {
            report_text: "   ".to_string(),
            chart_data: None,
        };
        assert!(matches!(
            validate(&report),
            Err(AppError::MalformedAiResponse(_))
        ));
    }

    #[test]
    fn label_value_length_mismatch_is_malformed() {
        let report = FinancialReport {
            report_text: "report".to_string(),
            chart_data: Some(ChartData {
                expense_breakdown: Some(series(&["Rent", "Payroll"], &[1200.0])),
                expense_pie_chart: None,
                trend_analysis: None,
            }),
        };
        assert!(matches!(
            validate(&report),
            Err(AppError::MalformedAiResponse(_))
        ));
    }

    #[test]
    fn trend_dataset_lengths_must_match_labels() {
        let report = FinancialReport {
            report_text: "report".to_string(),
            chart_data: Some(ChartData {
                expense_breakdown: None,
                expense_pie_chart: None,
                trend_analysis: Some(TrendData {
                    labels: vec!["Q1".to_string(), "Q2".to_string()],
                    datasets: vec![TrendSeries {
                        label: "Revenue".to_string(),
                        data: vec![100.0],
                    }],
                }),
            }),
        };
        assert!(matches!(
            validate(&report),
            Err(AppError::MalformedAiResponse(_))
        ));
    }

    #[test]
    fn schema_requires_report_text() {
        let schema = response_schema();
        assert_eq!(schema["required"][0], "reportText");
        assert_eq!(
            schema["properties"]["chartData"]["nullable"],
            serde_json::json!(true)
        );
    }

    #[test]
    fn non_json_output_is_malformed() {
        let parsed = serde_json::from_str::<FinancialReport>("Sure! Here is your report:");
        assert!(parsed.is_err());
    }
}
