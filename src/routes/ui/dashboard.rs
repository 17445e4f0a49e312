use askama::Template;
use axum::Extension;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};

use super::views::{AdmisionLine, ErrorLine, FunnelBar, InsightLine, PageChrome};
use crate::auth::CurrentSession;
use crate::client::{DashboardApi, Endpoint, MetricQuery};
use crate::dashboard::{self, KpiCard};
use crate::error::HtmlError;
use crate::metrics::format_decimal;
use crate::routes::NivelQuery;
use crate::rollup;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    page: PageChrome,
    cards: Vec<KpiCard>,
    conversion: String,
    avance: String,
    funnel: Vec<FunnelBar>,
    admisiones: Vec<AdmisionLine>,
    admision_total: Vec<AdmisionLine>,
    insights: Vec<InsightLine>,
    errors: Vec<ErrorLine>,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Html<String>, HtmlError> {
    let nivel = query.nivel();
    let fetcher = state.fetcher(&session);
    let overview = dashboard::load_overview(&fetcher, nivel).await?;

    state
        .sessions
        .update_context(&session.key, |ctx| overview.record_into(ctx))
        .await;

    let admisiones = overview.admisiones.as_deref().unwrap_or_default();
    let tmpl = DashboardTemplate {
        page: PageChrome::new(&session.username, nivel, "dashboard"),
        cards: overview
            .kpis
            .as_ref()
            .map(dashboard::kpi_cards)
            .unwrap_or_default(),
        conversion: format_decimal(overview.conversion),
        avance: format_decimal(overview.avance),
        funnel: overview
            .funnel
            .iter()
            .flatten()
            .map(FunnelBar::from)
            .collect(),
        admisiones: admisiones.iter().map(AdmisionLine::from).collect(),
        admision_total: if admisiones.is_empty() {
            Vec::new()
        } else {
            vec![AdmisionLine::from(&rollup::admision_totals(admisiones))]
        },
        insights: overview
            .insights
            .iter()
            .flatten()
            .map(InsightLine::from)
            .collect(),
        errors: overview.errors.iter().map(ErrorLine::from).collect(),
    };
    Ok(Html(tmpl.render()?))
}

/// Ask the backend to recompute its aggregates, then reload the dashboard.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Redirect, HtmlError> {
    let nivel = query.nivel();
    let fetcher = state.fetcher(&session);
    fetcher
        .post_json(
            Endpoint::Refresh,
            &MetricQuery::nivel(nivel),
            &serde_json::Value::Null,
        )
        .await?;
    tracing::info!("Dashboard refresh requested by {}", session.username);
    Ok(Redirect::to(&format!("/?nivel={nivel}")))
}
