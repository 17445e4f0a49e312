pub mod assistant;
pub mod dashboard;
pub mod leads;
pub mod login;
pub mod no_util;
pub mod programs;
pub mod views;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_session_page;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(dashboard::index))
        .route("/refresh", post(dashboard::refresh))
        .route("/admisiones", get(programs::index))
        .route("/no-util", get(no_util::index))
        .route("/leads", get(leads::index))
        .route("/asistente", get(assistant::index).post(assistant::ask))
        .route("/logout", post(login::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session_page,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/login", get(login::form).post(login::submit))
        .with_state(state)
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::{get as ax_get, post as ax_post};
    use axum::Json;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::SessionStore;
    use crate::client::BackendClient;

    async fn fake_backend() -> String {
        let app = Router::new()
            .route(
                "/api/auth/login",
                ax_post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secreto" {
                        (StatusCode::OK, Json(json!({ "access_token": "tok-1" })))
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "detail": "Usuario o contraseña incorrectos" })),
                        )
                    }
                }),
            )
            .route(
                "/api/dashboard/kpis",
                ax_get(|| async {
                    Json(json!({ "total_leads": 1000, "op_venta": 0, "pagados": 20, "metas": 500 }))
                }),
            )
            .route(
                "/api/dashboard/estados",
                ax_get(|| async {
                    Json(json!({ "estados_by_programa": [{ "op_venta": 100 }, { "op_venta": 20 }] }))
                }),
            )
            .route(
                "/api/dashboard/funnel",
                ax_get(|| async {
                    Json(json!([
                        { "stage": "Total Leads", "value": 1000, "percent": 100 },
                        { "stage": "Oportunidad de Venta", "value": 0, "percent": 0 }
                    ]))
                }),
            )
            .route("/api/dashboard/admisiones", ax_get(|| async { Json(json!([])) }))
            .route(
                "/api/ai/insights",
                ax_get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({}))) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn app_state(base: &str) -> AppState {
        let backend = BackendClient::new(base, Duration::from_secs(5)).unwrap();
        AppState::new(backend, SessionStore::default())
    }

    fn login_request(password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username=ana&password={password}")))
            .unwrap()
    }

    #[tokio::test]
    async fn pages_without_session_redirect_to_login() {
        let state = app_state("http://127.0.0.1:9").await;
        let resp = router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn login_page_renders() {
        let state = app_state("http://127.0.0.1:9").await;
        let resp = router(state)
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_password_rerenders_login_with_message() {
        let base = fake_backend().await;
        let resp = router(app_state(&base).await)
            .oneshot(login_request("nope"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Usuario o contraseña incorrectos"));
    }

    #[tokio::test]
    async fn login_sets_cookie_and_expired_token_logs_out() {
        let base = fake_backend().await;
        let state = app_state(&base).await;
        let app = router(state.clone());

        let resp = app.clone().oneshot(login_request("secreto")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let pair = cookie.split(';').next().unwrap().to_string();
        assert!(pair.starts_with("admisiones_session="));

        // The fake backend rejects the insights call, which ends the session.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/?nivel=GRADO")
                    .header(header::COOKIE, &pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login");

        let session_id = pair.trim_start_matches("admisiones_session=");
        assert!(state.sessions.lookup(session_id).await.is_none());
    }
}
