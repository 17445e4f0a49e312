use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::client::{self, DashboardApi, Endpoint, MetricQuery};
use crate::dashboard::{self, Overview};
use crate::error::AppError;
use crate::models::{AdmisionRow, FunnelStage, KpiSnapshot, LeadPage, NoUtilReason, ProgramEstado};
use crate::rollup::{self, AdmisionTotals, ProgramTotals};
use crate::routes::NivelQuery;
use crate::routes::ui::leads::LeadsQuery;
use crate::state::AppState;

pub async fn overview(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Overview>, AppError> {
    let overview = dashboard::load_overview(&state.fetcher(&session), query.nivel()).await?;
    state
        .sessions
        .update_context(&session.key, |ctx| overview.record_into(ctx))
        .await;
    Ok(Json(overview))
}

pub async fn kpis(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<KpiSnapshot>, AppError> {
    let nivel = query.nivel();
    let kpis = dashboard::load_kpis(&state.fetcher(&session), nivel).await?;
    state
        .sessions
        .update_context(&session.key, |ctx| ctx.record_kpis(nivel, &kpis))
        .await;
    Ok(Json(kpis))
}

pub async fn funnel(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Vec<FunnelStage>>, AppError> {
    let nivel = query.nivel();
    let stages = dashboard::load_funnel(&state.fetcher(&session), nivel).await?;
    state
        .sessions
        .update_context(&session.key, |ctx| ctx.record_funnel(nivel, &stages))
        .await;
    Ok(Json(stages))
}

#[derive(Debug, Serialize)]
pub struct EstadosBody {
    pub estados_by_programa: Vec<ProgramEstado>,
    pub totals: ProgramTotals,
    /// The totals in KPI shape, for comparison with `/api/kpis`.
    pub kpis: KpiSnapshot,
}

pub async fn estados(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<EstadosBody>, AppError> {
    let nivel = query.nivel();
    let rows = client::estados(&state.fetcher(&session), nivel)
        .await?
        .estados_by_programa
        .unwrap_or_default();
    state
        .sessions
        .update_context(&session.key, |ctx| ctx.record_estados(nivel, &rows))
        .await;
    let totals = rollup::rollup(&rows);
    Ok(Json(EstadosBody {
        kpis: totals.to_kpis(),
        totals,
        estados_by_programa: rows,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdmisionesBody {
    pub admisiones: Vec<AdmisionRow>,
    pub totals: AdmisionTotals,
}

pub async fn admisiones(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<AdmisionesBody>, AppError> {
    let nivel = query.nivel();
    let rows = client::admisiones(&state.fetcher(&session), nivel).await?;
    state
        .sessions
        .update_context(&session.key, |ctx| ctx.record_admisiones(nivel, &rows))
        .await;
    Ok(Json(AdmisionesBody {
        totals: rollup::admision_totals(&rows),
        admisiones: rows,
    }))
}

pub async fn no_util(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Vec<NoUtilReason>>, AppError> {
    let reasons = client::no_util(&state.fetcher(&session), query.nivel()).await?;
    Ok(Json(reasons))
}

pub async fn leads(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<LeadsQuery>,
) -> Result<Json<LeadPage>, AppError> {
    let page = client::leads(
        &state.fetcher(&session),
        query.nivel.unwrap_or_default(),
        &query.filters(),
    )
    .await?;
    Ok(Json(page))
}

pub async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Value>, AppError> {
    let result = state
        .fetcher(&session)
        .post_json(
            Endpoint::Refresh,
            &MetricQuery::nivel(query.nivel()),
            &Value::Null,
        )
        .await?;
    tracing::info!("Dashboard refresh requested by {}", session.username);
    Ok(Json(result))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<Value>, AppError> {
    let me = state
        .fetcher(&session)
        .get_json(Endpoint::Me, &MetricQuery::default())
        .await?;
    Ok(Json(me))
}

/// Raw JSON of the secondary dashboard endpoints.
pub async fn passthrough(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(name): Path<String>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Value>, AppError> {
    let endpoint = Endpoint::passthrough(&name)
        .ok_or_else(|| AppError::NotFound(format!("dashboard/{name}")))?;
    let value = state
        .fetcher(&session)
        .get_json(endpoint, &MetricQuery::nivel(query.nivel()))
        .await?;
    Ok(Json(value))
}
