use askama::Template;
use axum::Extension;
use axum::extract::{Query, State};
use axum::response::Html;

use super::views::{NoUtilLine, PageChrome};
use crate::auth::CurrentSession;
use crate::client;
use crate::error::HtmlError;
use crate::metrics::format_count;
use crate::routes::NivelQuery;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "no_util.html")]
struct NoUtilTemplate {
    page: PageChrome,
    reasons: Vec<NoUtilLine>,
    total_leads: String,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<NivelQuery>,
) -> Result<Html<String>, HtmlError> {
    let nivel = query.nivel();
    let fetcher = state.fetcher(&session);
    let reasons = client::no_util(&fetcher, nivel).await?;

    let total: u64 = reasons.iter().map(|r| r.leads).sum();
    let tmpl = NoUtilTemplate {
        page: PageChrome::new(&session.username, nivel, "no-util"),
        reasons: reasons.iter().map(NoUtilLine::from).collect(),
        total_leads: format_count(total),
    };
    Ok(Html(tmpl.render()?))
}
