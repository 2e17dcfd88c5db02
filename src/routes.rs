use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).fallback(handlers::method_not_allowed),
        )
        .route(
            "/categories/:id/questions",
            get(handlers::questions_by_category).fallback(handlers::method_not_allowed),
        )
        .route(
            "/questions",
            get(handlers::list_questions)
                .post(handlers::create_question)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/questions/:id",
            delete(handlers::delete_question).fallback(handlers::method_not_allowed),
        )
        .route(
            "/search",
            post(handlers::search_questions).fallback(handlers::method_not_allowed),
        )
        .route(
            "/quizzes",
            post(handlers::play_quiz).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryGateway;
    use axum::body::{to_bytes, Body};
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn call(method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = build_router(AppState::in_memory(InMemoryGateway::seeded(), Some(1)));
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn wrong_verb_gets_envelope() {
        let (status, body) = call(Method::DELETE, "/categories").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 405);
        assert_eq!(body["message"], "Method not allowed");

        let (status, _) = call(Method::GET, "/quizzes").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_route_gets_envelope() {
        let (status, body) = call(Method::GET, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Resource not found");
    }

    #[tokio::test]
    async fn non_numeric_ids_are_not_found() {
        let (status, _) = call(Method::DELETE, "/questions/abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(Method::GET, "/categories/abc/questions").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_question_table_is_not_found() {
        let (status, body) = call(Method::GET, "/questions").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], 404);
    }
}
