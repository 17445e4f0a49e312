pub mod ai;
pub mod exports;
pub mod metrics;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_session;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(metrics::me))
        .route("/overview", get(metrics::overview))
        .route("/kpis", get(metrics::kpis))
        .route("/funnel", get(metrics::funnel))
        .route("/estados", get(metrics::estados))
        .route("/admisiones", get(metrics::admisiones))
        .route("/no-util", get(metrics::no_util))
        .route("/leads", get(metrics::leads))
        .route("/refresh", post(metrics::refresh))
        .route("/dashboard/{name}", get(metrics::passthrough))
        // Downloads
        .route("/no-util.csv", get(exports::no_util_csv))
        .route("/leads.csv", get(exports::leads_csv))
        .route("/export", get(exports::dashboard_export))
        .route("/no-util-export", get(exports::no_util_export))
        // Assistant
        .route("/ai/chat", post(ai::chat))
        .route("/ai/insights", get(ai::insights))
        .route("/ai/predictions", get(ai::predictions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .with_state(state);

    Router::new().nest("/api", protected)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Json;
    use axum::body::Body;
    use axum::extract::Query;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::get as ax_get;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::SessionStore;
    use crate::client::BackendClient;

    async fn fake_backend() -> String {
        let app = Router::new()
            .route(
                "/api/dashboard/kpis",
                ax_get(|| async {
                    Json(json!({
                        "total_leads": 1000, "en_gestion": 400, "op_venta": 0,
                        "proceso_pago": 50, "pagados": 20, "metas": 500
                    }))
                }),
            )
            .route(
                "/api/dashboard/estados",
                ax_get(|Query(q): Query<Vec<(String, String)>>| async move {
                    let nivel = q
                        .iter()
                        .find(|(k, _)| k == "nivel")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    Json(json!({ "estados_by_programa": [
                        { "programa": "Derecho", "nivel": nivel, "op_venta": 100, "leads": 600 },
                        { "programa": "Medicina", "op_venta": 20, "leads": 400 }
                    ]}))
                }),
            )
            .route(
                "/api/dashboard/no-util",
                ax_get(|| async {
                    Json(json!([
                        { "subcategoria": "Número errado, inválido", "leads": 12, "porcentaje": 40 }
                    ]))
                }),
            )
            .route(
                "/api/dashboard/meta",
                ax_get(|| async { Json(json!({ "meta": 500 })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn logged_in(base: &str) -> (AppState, String) {
        let backend = BackendClient::new(base, Duration::from_secs(5)).unwrap();
        let state = AppState::new(backend, SessionStore::default());
        let session_id = state.sessions.create("ana", "tok-1".to_string()).await;
        (state, format!("admisiones_session={session_id}"))
    }

    fn get_with(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_requests_get_json_401() {
        let state = AppState::new(
            BackendClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
            SessionStore::default(),
        );
        let resp = router(state)
            .oneshot(Request::builder().uri("/api/kpis").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn kpis_are_backfilled_and_recorded_in_context() {
        let base = fake_backend().await;
        let (state, cookie) = logged_in(&base).await;

        let resp = router(state.clone())
            .oneshot(get_with("/api/kpis?nivel=GRADO", &cookie))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["op_venta"], 120);
        assert_eq!(body["total_leads"], 1000);

        let key = state.sessions.lookup(cookie.trim_start_matches("admisiones_session="))
            .await
            .unwrap()
            .key;
        let ctx = state.sessions.context(&key).await;
        assert_eq!(ctx.kpis.map(|k| k.op_venta), Some(120));
    }

    #[tokio::test]
    async fn estados_come_with_totals() {
        let base = fake_backend().await;
        let (state, cookie) = logged_in(&base).await;

        let resp = router(state)
            .oneshot(get_with("/api/estados?nivel=POSGRADO", &cookie))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["totals"]["op_venta"], 120);
        assert_eq!(body["totals"]["leads"], 1000);
        assert_eq!(body["estados_by_programa"][0]["nivel"], "POSGRADO");
    }

    #[tokio::test]
    async fn no_util_csv_is_an_attachment() {
        let base = fake_backend().await;
        let (state, cookie) = logged_in(&base).await;

        let resp = router(state)
            .oneshot(get_with("/api/no-util.csv", &cookie))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(
            csv,
            "subcategoria,leads,porcentaje,leads_7d,leads_14d\n\"Número errado, inválido\",12,40.00,0,0\n"
        );
    }

    #[tokio::test]
    async fn passthrough_only_knows_dashboard_extras() {
        let base = fake_backend().await;
        let (state, cookie) = logged_in(&base).await;
        let app = router(state);

        let resp = app
            .clone()
            .oneshot(get_with("/api/dashboard/meta", &cookie))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, json!({ "meta": 500 }));

        let resp = app
            .oneshot(get_with("/api/dashboard/kpis", &cookie))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_chat_message_is_rejected() {
        let base = fake_backend().await;
        let (state, cookie) = logged_in(&base).await;

        let resp = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai/chat")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
