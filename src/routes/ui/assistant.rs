use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Extension, Form};
use serde::Deserialize;

use super::views::PageChrome;
use crate::auth::CurrentSession;
use crate::context::AnalyticsContext;
use crate::dashboard;
use crate::error::{AppError, HtmlError};
use crate::routes::NivelQuery;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "asistente.html")]
struct AssistantTemplate {
    page: PageChrome,
    context_summary: Vec<&'static str>,
    updated_at: String,
    question: String,
    answer: Option<String>,
    error: Option<String>,
}

impl AssistantTemplate {
    fn new(session: &CurrentSession, ctx: &AnalyticsContext) -> Self {
        let mut summary = Vec::new();
        if ctx.kpis.is_some() {
            summary.push("KPIs");
        }
        if ctx.funnel.is_some() {
            summary.push("Embudo");
        }
        if ctx.admisiones.is_some() {
            summary.push("Admisiones por programa");
        }
        if ctx.estados.is_some() {
            summary.push("Estados por programa");
        }
        AssistantTemplate {
            page: PageChrome::new(&session.username, ctx.nivel, "asistente"),
            context_summary: summary,
            updated_at: ctx
                .updated_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_default(),
            question: String::new(),
            answer: None,
            error: None,
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Html<String>, HtmlError> {
    let mut ctx = state.sessions.context(&session.key).await;
    if let Some(nivel) = query.nivel {
        ctx.nivel = nivel;
    }
    let tmpl = AssistantTemplate::new(&session, &ctx);
    Ok(Html(tmpl.render()?))
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub message: String,
}

pub async fn ask(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Form(input): Form<AskForm>,
) -> Result<Html<String>, HtmlError> {
    let ctx = state.sessions.context(&session.key).await;
    let fetcher = state.fetcher(&session);

    let mut tmpl = AssistantTemplate::new(&session, &ctx);
    tmpl.question = input.message.clone();
    match dashboard::ask_assistant(&fetcher, &ctx, &input.message).await {
        Ok(reply) => tmpl.answer = Some(reply.response),
        Err(AppError::Unauthorized) => return Err(AppError::Unauthorized.into()),
        Err(e) => tmpl.error = Some(e.to_string()),
    }
    Ok(Html(tmpl.render()?))
}
