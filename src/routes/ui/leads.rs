use askama::Template;
use axum::Extension;
use axum::extract::{Query, State};
use axum::response::Html;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

use super::views::{LeadLine, PageChrome};
use crate::auth::CurrentSession;
use crate::client;
use crate::error::HtmlError;
use crate::metrics::format_count;
use crate::models::Nivel;
use crate::models::leads::LeadFilters;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "leads.html")]
struct LeadsTemplate {
    page: PageChrome,
    leads: Vec<LeadLine>,
    search: String,
    total: String,
    current_page: u64,
    total_pages: u64,
    prev_href: Option<String>,
    next_href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeadsQuery {
    pub nivel: Option<Nivel>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

impl LeadsQuery {
    pub fn filters(&self) -> LeadFilters {
        LeadFilters {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
        }
    }
}

fn page_href(nivel: Nivel, page: u64, page_size: u64, search: Option<&str>) -> String {
    let mut href = format!("/leads?nivel={nivel}&page={page}&page_size={page_size}");
    if let Some(search) = search {
        href.push_str("&search=");
        href.extend(utf8_percent_encode(search, NON_ALPHANUMERIC));
    }
    href
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<LeadsQuery>,
) -> Result<Html<String>, HtmlError> {
    let nivel = query.nivel.unwrap_or_default();
    let filters = query.filters();
    let fetcher = state.fetcher(&session);
    let result = client::leads(&fetcher, nivel, &filters).await?;

    let current = result.page;
    let total_pages = result.total_pages();
    let search = filters.search();
    let tmpl = LeadsTemplate {
        page: PageChrome::new(&session.username, nivel, "leads"),
        leads: result.items.iter().map(LeadLine::from).collect(),
        search: search.unwrap_or_default().to_string(),
        total: format_count(result.total),
        current_page: current,
        total_pages,
        prev_href: (current > 1)
            .then(|| page_href(nivel, current - 1, result.page_size, search)),
        next_href: (current < total_pages)
            .then(|| page_href(nivel, current + 1, result.page_size, search)),
    };
    Ok(Html(tmpl.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_links_encode_search() {
        assert_eq!(
            page_href(Nivel::Grado, 2, 50, Some("ana maría")),
            "/leads?nivel=GRADO&page=2&page_size=50&search=ana%20mar%C3%ADa"
        );
        assert_eq!(
            page_href(Nivel::Todos, 1, 25, None),
            "/leads?nivel=TODOS&page=1&page_size=25"
        );
    }
}
