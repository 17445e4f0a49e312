use axum::Extension;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::auth::CurrentSession;
use crate::client::{self, Blob, DashboardApi, Endpoint, MetricQuery};
use crate::error::AppError;
use crate::export;
use crate::models::Nivel;
use crate::models::leads::LeadFilters;
use crate::routes::NivelQuery;
use crate::routes::ui::leads::LeadsQuery;
use crate::state::AppState;

const CSV: &str = "text/csv; charset=utf-8";
const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// `{prefix}_{nivel}_{YYYYMMDD}.{ext}`, used when the backend sends no name.
fn dated_filename(prefix: &str, nivel: Nivel, ext: &str) -> String {
    let day = chrono::Local::now().format("%Y%m%d");
    format!("{prefix}_{}_{day}.{ext}", nivel.as_str().to_lowercase())
}

fn forward(blob: Blob, default_type: &str, fallback_name: String) -> Response {
    let content_type = blob.content_type.unwrap_or_else(|| default_type.to_string());
    let filename = blob.filename.unwrap_or(fallback_name);
    attachment(&content_type, &filename, blob.bytes)
}

pub async fn no_util_csv(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Response, AppError> {
    let nivel = query.nivel();
    let reasons = client::no_util(&state.fetcher(&session), nivel).await?;
    let csv = export::no_util_csv(&reasons);
    Ok(attachment(CSV, &dated_filename("no_util", nivel, "csv"), csv.into_bytes()))
}

/// One page of leads as CSV, at the largest page size the backend allows.
pub async fn leads_csv(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<LeadsQuery>,
) -> Result<Response, AppError> {
    let nivel = query.nivel.unwrap_or_default();
    let filters = LeadFilters {
        page_size: Some(query.page_size.unwrap_or(LeadFilters::MAX_PAGE_SIZE)),
        ..query.filters()
    };
    let page = client::leads(&state.fetcher(&session), nivel, &filters).await?;
    let csv = export::leads_csv(&page.items);
    Ok(attachment(CSV, &dated_filename("leads", nivel, "csv"), csv.into_bytes()))
}

pub async fn dashboard_export(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Response, AppError> {
    let nivel = query.nivel();
    let blob = state
        .fetcher(&session)
        .get_blob(Endpoint::Export, &MetricQuery::nivel(nivel))
        .await?;
    tracing::info!("Dashboard export ({} bytes) for {}", blob.bytes.len(), session.username);
    Ok(forward(blob, XLSX, dated_filename("dashboard", nivel, "xlsx")))
}

pub async fn no_util_export(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Response, AppError> {
    let nivel = query.nivel();
    let blob = state
        .fetcher(&session)
        .get_blob(Endpoint::NoUtilCsv, &MetricQuery::nivel(nivel))
        .await?;
    Ok(forward(blob, CSV, dated_filename("no_util", nivel, "csv")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_names_carry_level_and_day() {
        let name = dated_filename("dashboard", Nivel::Posgrado, "xlsx");
        assert!(name.starts_with("dashboard_posgrado_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "dashboard_posgrado_20260101.xlsx".len());
    }

    #[test]
    fn backend_filename_wins_over_fallback() {
        let blob = Blob {
            content_type: None,
            filename: Some("reporte.xlsx".into()),
            bytes: vec![1, 2, 3],
        };
        let resp = forward(blob, XLSX, "fallback.xlsx".into());
        assert_eq!(resp.headers()[CONTENT_TYPE], XLSX);
        assert_eq!(
            resp.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"reporte.xlsx\""
        );
    }
}
