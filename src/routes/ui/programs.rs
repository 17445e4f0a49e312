use askama::Template;
use axum::Extension;
use axum::extract::{Query, State};
use axum::response::Html;

use super::views::{AdmisionLine, ErrorLine, EstadoLine, PageChrome};
use crate::auth::CurrentSession;
use crate::dashboard;
use crate::error::HtmlError;
use crate::routes::NivelQuery;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "admisiones.html")]
struct ProgramsTemplate {
    page: PageChrome,
    admisiones: Vec<AdmisionLine>,
    admision_total: Vec<AdmisionLine>,
    estados: Vec<EstadoLine>,
    estado_total: Vec<EstadoLine>,
    errors: Vec<ErrorLine>,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Html<String>, HtmlError> {
    let nivel = query.nivel();
    let fetcher = state.fetcher(&session);
    let view = dashboard::load_programs(&fetcher, nivel).await?;

    state
        .sessions
        .update_context(&session.key, |ctx| view.record_into(ctx))
        .await;

    let tmpl = ProgramsTemplate {
        page: PageChrome::new(&session.username, nivel, "admisiones"),
        admisiones: view
            .admisiones
            .iter()
            .flatten()
            .map(AdmisionLine::from)
            .collect(),
        admision_total: view.admision_totals.iter().map(AdmisionLine::from).collect(),
        estados: view.estados.iter().flatten().map(EstadoLine::from).collect(),
        estado_total: view.estado_totals.iter().map(EstadoLine::from).collect(),
        errors: view.errors.iter().map(ErrorLine::from).collect(),
    };
    Ok(Html(tmpl.render()?))
}
