use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::client::{self, DashboardApi, Endpoint, MetricQuery};
use crate::dashboard;
use crate::error::AppError;
use crate::models::Nivel;
use crate::models::ai::{ChatReply, Insight};
use crate::routes::NivelQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub message: String,
    /// Overrides the level recorded in the session context.
    pub nivel: Option<Nivel>,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(input): Json<ChatInput>,
) -> Result<Json<ChatReply>, AppError> {
    let mut ctx = state.sessions.context(&session.key).await;
    if let Some(nivel) = input.nivel {
        ctx.nivel = nivel;
    }
    let reply = dashboard::ask_assistant(&state.fetcher(&session), &ctx, &input.message).await?;
    Ok(Json(reply))
}

pub async fn insights(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let insights = client::insights(&state.fetcher(&session), query.nivel()).await?;
    Ok(Json(insights))
}

pub async fn predictions(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Json<Value>, AppError> {
    let value = state
        .fetcher(&session)
        .get_json(Endpoint::Predictions, &MetricQuery::nivel(query.nivel()))
        .await?;
    Ok(Json(value))
}
