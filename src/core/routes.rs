// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Public endpoints
        .route("/health", get(crate::handlers::health::health_handler))
        .route("/login", post(crate::handlers::session::login_handler))

        // Session endpoints (require bearer token)
        .route("/logout", post(crate::handlers::session::logout_handler))
        .route("/me", get(crate::handlers::session::me_handler))
        .route(
            "/attendance",
            get(crate::handlers::attendance::list_handler).post(crate::handlers::attendance::record_handler),
        )
        .route("/supervisor/students", get(crate::handlers::attendance::students_handler))

        // Admin endpoints
        .route(
            "/admin/users/{role}",
            get(crate::handlers::admin::list_users_handler).post(crate::handlers::admin::create_user_handler),
        )
        .route(
            "/admin/users/{role}/{id}",
            patch(crate::handlers::admin::update_user_handler)
                .delete(crate::handlers::admin::delete_user_handler),
        )
        .route("/admin/overview", get(crate::handlers::admin::overview_handler))
        .route(
            "/admin/supervisors/{id}/students",
            get(crate::handlers::admin::supervisor_students_handler),
        )

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorResponse;
    use crate::models::account::{AccountSummary, UserCounts};
    use crate::models::api::{ItemResponse, ListResponse, LoginResponse};
    use crate::models::attendance::AttendanceRecord;
    use crate::testing::{read_json, test_state};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_then_read_attendance() {
        let (state, _) = test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(json_post(
                "/login",
                serde_json::json!({"username": "jdoe", "password": "pw1"}),
            ))
            .await
            .unwrap();
        let (status, login): (_, LoginResponse) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/attendance")
            .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let (status, body): (_, ListResponse<AttendanceRecord>) = read_json(response).await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R5", "R1"]);
    }

    #[tokio::test]
    async fn test_admin_route_without_token_is_401() {
        let (state, _) = test_state();
        let request = Request::builder()
            .uri("/admin/users/student")
            .body(Body::empty())
            .unwrap();

        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let (state, _) = test_state();
        let request = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();

        let response = build_router(state).oneshot(request).await.unwrap();
        let (status, body): (_, ErrorResponse) = read_json(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
    }

    async fn admin_token(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_post(
                "/login",
                serde_json::json!({"username": "root", "password": "rootpw"}),
            ))
            .await
            .unwrap();
        let (_, login): (_, LoginResponse) = read_json(response).await;
        login.token
    }

    #[tokio::test]
    async fn test_patch_user_route() {
        let (state, _) = test_state();
        let app = build_router(state);
        let token = admin_token(&app).await;

        let request = Request::builder()
            .method("PATCH")
            .uri("/admin/users/parent/P4")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({"name": "Zed Z. Zulu"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let (status, body): (_, ItemResponse<AccountSummary>) = read_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.item.name, "Zed Z. Zulu");
    }

    #[tokio::test]
    async fn test_overview_route() {
        let (state, _) = test_state();
        let app = build_router(state);
        let token = admin_token(&app).await;

        let request = Request::builder()
            .uri("/admin/overview")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let (status, body): (_, ItemResponse<UserCounts>) = read_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.item.student, 4);
    }
}
