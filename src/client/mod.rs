// Backend access layer.
// `DashboardApi` is the seam between the dashboard logic and the HTTP
// fetcher, so reconciliation can be exercised against canned responses.

pub mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::ai::{ChatReply, ChatRequest, Insight, InsightsResponse};
use crate::models::leads::LeadFilters;
use crate::models::{
    AdmisionRow, AdmisionesResponse, EstadosResponse, FunnelResponse, FunnelStage, KpiSnapshot,
    LeadPage, Nivel, NoUtilReason, NoUtilResponse,
};

pub use http::{BackendClient, MetricFetcher};

/// Backend endpoints the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Me,
    Kpis,
    Funnel,
    Admisiones,
    Estados,
    NoUtil,
    NoUtilCsv,
    Admitidos,
    Leads,
    Bases,
    EstadosGestion,
    Meta,
    Refresh,
    Export,
    Chat,
    Insights,
    Predictions,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Me => "/api/auth/me",
            Endpoint::Kpis => "/api/dashboard/kpis",
            Endpoint::Funnel => "/api/dashboard/funnel",
            Endpoint::Admisiones => "/api/dashboard/admisiones",
            Endpoint::Estados => "/api/dashboard/estados",
            Endpoint::NoUtil => "/api/dashboard/no-util",
            Endpoint::NoUtilCsv => "/api/dashboard/no-util-csv",
            Endpoint::Admitidos => "/api/dashboard/admitidos",
            Endpoint::Leads => "/api/dashboard/leads",
            Endpoint::Bases => "/api/dashboard/bases",
            Endpoint::EstadosGestion => "/api/dashboard/estados-gestion",
            Endpoint::Meta => "/api/dashboard/meta",
            Endpoint::Refresh => "/api/dashboard/refresh",
            Endpoint::Export => "/api/dashboard/export",
            Endpoint::Chat => "/api/ai/chat",
            Endpoint::Insights => "/api/ai/insights",
            Endpoint::Predictions => "/api/ai/predictions",
        }
    }

    /// Endpoints that are only re-exposed as raw JSON.
    pub fn passthrough(name: &str) -> Option<Endpoint> {
        match name {
            "admitidos" => Some(Endpoint::Admitidos),
            "bases" => Some(Endpoint::Bases),
            "estados-gestion" => Some(Endpoint::EstadosGestion),
            "meta" => Some(Endpoint::Meta),
            _ => None,
        }
    }
}

/// Query parameters of a dashboard request. The cache-busting `t` is added
/// by the fetcher at send time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricQuery {
    pub nivel: Option<Nivel>,
    pub params: Vec<(String, String)>,
}

impl MetricQuery {
    pub fn nivel(nivel: Nivel) -> Self {
        MetricQuery {
            nivel: Some(nivel),
            params: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn to_pairs(&self, timestamp_ms: i64) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 2);
        if let Some(nivel) = self.nivel {
            pairs.push(("nivel".to_string(), nivel.as_str().to_string()));
        }
        pairs.extend(self.params.iter().cloned());
        pairs.push(("t".to_string(), timestamp_ms.to_string()));
        pairs
    }
}

/// A downloaded file, forwarded as-is to the browser.
#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where the bearer token lives. Cleared when the backend rejects it.
#[async_trait]
pub trait Credentials: Send + Sync {
    async fn token(&self) -> Option<String>;
    async fn clear(&self);
}

/// Credential held in memory for one-shot CLI use.
pub struct StaticToken(RwLock<Option<String>>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(RwLock::new(Some(token.into())))
    }
}

#[async_trait]
impl Credentials for StaticToken {
    async fn token(&self) -> Option<String> {
        self.0.read().await.clone()
    }

    async fn clear(&self) {
        *self.0.write().await = None;
    }
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn get_json(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Value, AppError>;

    async fn post_json(
        &self,
        endpoint: Endpoint,
        query: &MetricQuery,
        body: &Value,
    ) -> Result<Value, AppError>;

    async fn get_blob(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Blob, AppError>;
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Decode(format!("{}: {e}", endpoint.path())))
}

pub async fn fetch_as<T: DeserializeOwned>(
    api: &dyn DashboardApi,
    endpoint: Endpoint,
    query: &MetricQuery,
) -> Result<T, AppError> {
    let value = api.get_json(endpoint, query).await?;
    decode(endpoint, value)
}

pub async fn kpis(api: &dyn DashboardApi, nivel: Nivel) -> Result<KpiSnapshot, AppError> {
    fetch_as(api, Endpoint::Kpis, &MetricQuery::nivel(nivel)).await
}

pub async fn funnel(api: &dyn DashboardApi, nivel: Nivel) -> Result<Vec<FunnelStage>, AppError> {
    let resp: FunnelResponse = fetch_as(api, Endpoint::Funnel, &MetricQuery::nivel(nivel)).await?;
    Ok(resp.into_stages())
}

pub async fn estados(api: &dyn DashboardApi, nivel: Nivel) -> Result<EstadosResponse, AppError> {
    fetch_as(api, Endpoint::Estados, &MetricQuery::nivel(nivel)).await
}

pub async fn admisiones(api: &dyn DashboardApi, nivel: Nivel) -> Result<Vec<AdmisionRow>, AppError> {
    let resp: AdmisionesResponse =
        fetch_as(api, Endpoint::Admisiones, &MetricQuery::nivel(nivel)).await?;
    Ok(resp.into_rows())
}

pub async fn no_util(api: &dyn DashboardApi, nivel: Nivel) -> Result<Vec<NoUtilReason>, AppError> {
    let resp: NoUtilResponse = fetch_as(api, Endpoint::NoUtil, &MetricQuery::nivel(nivel)).await?;
    Ok(resp.into_reasons())
}

pub async fn leads(
    api: &dyn DashboardApi,
    nivel: Nivel,
    filters: &LeadFilters,
) -> Result<LeadPage, AppError> {
    let mut query = MetricQuery::nivel(nivel)
        .with("page", filters.page())
        .with("page_size", filters.page_size());
    if let Some(search) = filters.search() {
        query = query.with("search", search);
    }
    let mut page: LeadPage = fetch_as(api, Endpoint::Leads, &query).await?;
    if page.page == 0 {
        page.page = filters.page();
    }
    if page.page_size == 0 {
        page.page_size = filters.page_size();
    }
    Ok(page)
}

pub async fn insights(api: &dyn DashboardApi, nivel: Nivel) -> Result<Vec<Insight>, AppError> {
    let resp: InsightsResponse =
        fetch_as(api, Endpoint::Insights, &MetricQuery::nivel(nivel)).await?;
    Ok(resp.into_insights())
}

pub async fn chat(api: &dyn DashboardApi, request: &ChatRequest) -> Result<ChatReply, AppError> {
    let body = serde_json::to_value(request).map_err(|e| AppError::Internal(e.to_string()))?;
    let value = api
        .post_json(Endpoint::Chat, &MetricQuery::nivel(request.nivel), &body)
        .await?;
    decode(Endpoint::Chat, value)
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Canned backend: each endpoint answers with a JSON body or an HTTP
    /// status that is turned into the matching error.
    #[derive(Default)]
    pub struct MockApi {
        responses: HashMap<Endpoint, Result<Value, u16>>,
        calls: Mutex<Vec<(Endpoint, MetricQuery)>>,
        bodies: Mutex<Vec<Value>>,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, endpoint: Endpoint, body: Value) -> Self {
            self.responses.insert(endpoint, Ok(body));
            self
        }

        pub fn fail(mut self, endpoint: Endpoint, status: u16) -> Self {
            self.responses.insert(endpoint, Err(status));
            self
        }

        pub fn calls_to(&self, endpoint: Endpoint) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(e, _)| *e == endpoint)
                .count()
        }

        pub fn last_query(&self, endpoint: Endpoint) -> Option<MetricQuery> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(e, _)| *e == endpoint)
                .map(|(_, q)| q.clone())
        }

        pub fn last_body(&self) -> Option<Value> {
            self.bodies.lock().unwrap().last().cloned()
        }

        fn answer(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Value, AppError> {
            self.calls.lock().unwrap().push((endpoint, query.clone()));
            match self.responses.get(&endpoint) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(401)) => Err(AppError::Unauthorized),
                Some(Err(status)) => Err(AppError::Backend {
                    status: *status,
                    detail: format!("Request failed with status {status}"),
                }),
                None => Err(AppError::NotFound(endpoint.path().to_string())),
            }
        }
    }

    #[async_trait]
    impl DashboardApi for MockApi {
        async fn get_json(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Value, AppError> {
            self.answer(endpoint, query)
        }

        async fn post_json(
            &self,
            endpoint: Endpoint,
            query: &MetricQuery,
            body: &Value,
        ) -> Result<Value, AppError> {
            self.bodies.lock().unwrap().push(body.clone());
            self.answer(endpoint, query)
        }

        async fn get_blob(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Blob, AppError> {
            let body = self.answer(endpoint, query)?;
            Ok(Blob {
                content_type: Some("text/csv".to_string()),
                filename: None,
                bytes: body.as_str().unwrap_or_default().as_bytes().to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockApi;
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_put_nivel_first_and_timestamp_last() {
        let query = MetricQuery::nivel(Nivel::Grado).with("page", 2);
        let pairs = query.to_pairs(1_700_000_000_000);
        assert_eq!(pairs[0], ("nivel".to_string(), "GRADO".to_string()));
        assert_eq!(pairs[1], ("page".to_string(), "2".to_string()));
        assert_eq!(pairs[2], ("t".to_string(), "1700000000000".to_string()));
    }

    #[test]
    fn passthrough_only_covers_raw_endpoints() {
        assert_eq!(Endpoint::passthrough("bases"), Some(Endpoint::Bases));
        assert_eq!(Endpoint::passthrough("kpis"), None);
    }

    #[tokio::test]
    async fn leads_forwards_paging_and_search() {
        let api = MockApi::new().respond(
            Endpoint::Leads,
            json!({ "items": [{ "id": 1 }], "total": 1 }),
        );
        let filters = LeadFilters {
            page: Some(3),
            page_size: None,
            search: Some(" ana ".into()),
        };
        let page = leads(&api, Nivel::Posgrado, &filters).await.unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, LeadFilters::DEFAULT_PAGE_SIZE);

        let sent = api.last_query(Endpoint::Leads).unwrap();
        assert_eq!(sent.nivel, Some(Nivel::Posgrado));
        assert!(sent.params.contains(&("search".to_string(), "ana".to_string())));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let api = MockApi::new().respond(Endpoint::Estados, json!("nope"));
        let err = estados(&api, Nivel::Todos).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn object_without_the_list_key_is_a_decode_error() {
        let api = MockApi::new()
            .respond(Endpoint::Funnel, json!({ "detail": "cache warming" }))
            .respond(Endpoint::Admisiones, json!({ "detail": "cache warming" }))
            .respond(Endpoint::NoUtil, json!({ "status": "ok" }))
            .respond(Endpoint::Insights, json!({}));

        let err = funnel(&api, Nivel::Todos).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
        let err = admisiones(&api, Nivel::Todos).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
        let err = no_util(&api, Nivel::Todos).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
        let err = insights(&api, Nivel::Todos).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn wrapped_empty_list_is_no_data() {
        let api = MockApi::new().respond(Endpoint::Funnel, json!({ "funnel": [] }));
        assert!(funnel(&api, Nivel::Todos).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn static_token_can_be_cleared() {
        let creds = StaticToken::new("abc");
        assert_eq!(creds.token().await.as_deref(), Some("abc"));
        creds.clear().await;
        assert_eq!(creds.token().await, None);
    }
}
