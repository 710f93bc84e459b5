//! # Report Export
//!
//! Turns sales and profit reports into downloadable files.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Report<SalesRow> ──► ReportTable { headers, rows, total }              │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      ReportRenderer                                     │
//! │                 ┌────────────┴────────────┐                             │
//! │        render_spreadsheet            render_pdf                         │
//! │          (csv bytes)           (Unsupported for DelimitedRenderer)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tally_core::{ProfitRow, Report, SalesRow};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported report format: {0}")]
    Unsupported(String),
}

/// Formats accepted by `?format=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// A report flattened to text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Trailing `Total` row.
    pub total: String,
}

impl ReportTable {
    pub fn sales(report: &Report<SalesRow>) -> Self {
        ReportTable {
            title: "sales".to_string(),
            headers: to_strings(&[
                "Invoice",
                "Date",
                "Cashier",
                "Customer",
                "Items",
                "Discount",
                "Grand Total",
            ]),
            rows: report
                .rows
                .iter()
                .map(|row| {
                    vec![
                        row.invoice.clone().unwrap_or_default(),
                        row.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        row.cashier.clone(),
                        row.customer.clone().unwrap_or_else(|| "-".to_string()),
                        row.line_count.to_string(),
                        row.discount.to_string(),
                        row.grand_total.to_string(),
                    ]
                })
                .collect(),
            total: report.total.to_string(),
        }
    }

    pub fn profits(report: &Report<ProfitRow>) -> Self {
        ReportTable {
            title: "profits".to_string(),
            headers: to_strings(&["Invoice", "Date", "Profit"]),
            rows: report
                .rows
                .iter()
                .map(|row| {
                    vec![
                        row.invoice.clone().unwrap_or_default(),
                        row.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        row.total.to_string(),
                    ]
                })
                .collect(),
            total: report.total.to_string(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Renders report tables into file bytes.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render_spreadsheet(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError>;

    async fn render_pdf(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError>;
}

/// Delimited text output. Fields containing the delimiter, quotes or line
/// breaks are quoted.
#[derive(Debug, Clone)]
pub struct DelimitedRenderer {
    delimiter: char,
}

impl DelimitedRenderer {
    pub fn csv() -> Self {
        DelimitedRenderer { delimiter: ',' }
    }

    fn escape_field(&self, value: &str) -> String {
        if value.contains(self.delimiter)
            || value.contains('"')
            || value.contains('\n')
            || value.contains('\r')
        {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn line(&self, cells: &[String]) -> String {
        cells
            .iter()
            .map(|cell| self.escape_field(cell))
            .collect::<Vec<_>>()
            .join(&self.delimiter.to_string())
    }
}

impl Default for DelimitedRenderer {
    fn default() -> Self {
        DelimitedRenderer::csv()
    }
}

#[async_trait]
impl ReportRenderer for DelimitedRenderer {
    async fn render_spreadsheet(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        let mut lines = Vec::with_capacity(table.rows.len() + 2);
        lines.push(self.line(&table.headers));
        for row in &table.rows {
            lines.push(self.line(row));
        }

        let mut footer = vec![String::new(); table.headers.len().max(2)];
        footer[0] = "Total".to_string();
        if let Some(last) = footer.last_mut() {
            *last = table.total.clone();
        }
        lines.push(self.line(&footer));

        let mut out = lines.join("\r\n");
        out.push_str("\r\n");
        Ok(out.into_bytes())
    }

    async fn render_pdf(&self, _table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unsupported("pdf".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tally_core::Money;

    fn sales_report() -> Report<SalesRow> {
        Report {
            rows: vec![SalesRow {
                order_id: 1,
                invoice: Some("26.10.INV/ORD/1".to_string()),
                cashier: "Ana Putri".to_string(),
                customer: Some("Doe, John".to_string()),
                line_count: 2,
                discount: Money::from_cents(250),
                grand_total: Money::from_cents(2250),
                created_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
            }],
            total: Money::from_cents(2250),
        }
    }

    #[tokio::test]
    async fn test_csv_output() {
        let table = ReportTable::sales(&sales_report());
        let bytes = DelimitedRenderer::csv().render_spreadsheet(&table).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines[0], "Invoice,Date,Cashier,Customer,Items,Discount,Grand Total");
        assert_eq!(
            lines[1],
            "26.10.INV/ORD/1,2026-10-16 09:30,Ana Putri,\"Doe, John\",2,2.50,22.50"
        );
        assert_eq!(lines[2], "Total,,,,,,22.50");
    }

    #[test]
    fn test_escape_quotes() {
        let renderer = DelimitedRenderer::csv();
        assert_eq!(renderer.escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(renderer.escape_field("plain"), "plain");
    }

    #[tokio::test]
    async fn test_pdf_is_unsupported() {
        let table = ReportTable::profits(&Report {
            rows: Vec::new(),
            total: Money::zero(),
        });
        let err = DelimitedRenderer::csv().render_pdf(&table).await.unwrap_err();
        assert!(matches!(err, RenderError::Unsupported(format) if format == "pdf"));
    }
}
