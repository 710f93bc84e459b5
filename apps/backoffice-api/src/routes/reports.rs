//! Sales and profit reports, as JSON or as a file. Guarded by `reports`.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tally_core::input::ReportRange;
use tally_core::{ProfitRow, Report, SalesRow};

use crate::error::{ApiError, ApiResult};
use crate::reports::{ExportFormat, ReportTable};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports/sales", get(sales))
        .route("/api/reports/profits", get(profits))
        .route("/api/reports/{kind}/export", get(export))
}

async fn sales(
    State(state): State<AppState>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Json<Report<SalesRow>>> {
    let (start, end) = range.parse()?;
    Ok(Json(state.db.reports().sales_between(start, end).await?))
}

async fn profits(
    State(state): State<AppState>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Json<Report<ProfitRow>>> {
    let (start, end) = range.parse()?;
    Ok(Json(state.db.reports().profits_between(start, end).await?))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    format: Option<String>,
}

async fn export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(q): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let format = match q.format.as_deref().unwrap_or("csv") {
        "csv" => ExportFormat::Csv,
        "pdf" => ExportFormat::Pdf,
        other => return Err(ApiError::validation(format!("unsupported report format: {other}"))),
    };

    let range = ReportRange {
        start_date: q.start_date,
        end_date: q.end_date,
    };
    let (start, end) = range.parse()?;

    let table = match kind.as_str() {
        "sales" => ReportTable::sales(&state.db.reports().sales_between(start, end).await?),
        "profits" => ReportTable::profits(&state.db.reports().profits_between(start, end).await?),
        other => return Err(ApiError::not_found(format!("Report not found: {other}"))),
    };

    let bytes = match format {
        ExportFormat::Csv => state.renderer.render_spreadsheet(&table).await?,
        ExportFormat::Pdf => state.renderer.render_pdf(&table).await?,
    };

    let filename = format!("{}_{}_{}.{}", table.title, start, end, format.extension());
    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
