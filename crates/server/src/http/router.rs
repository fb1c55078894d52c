use super::handlers::{comments, sse};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(METHODS)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(METHODS)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route(
            "/api/commentables/:kind/:id/comments",
            get(comments::list_comments),
        )
        .route(
            "/api/commentables/:kind/:id/comments/sse",
            get(sse::sse_handler),
        )
        .route(
            "/api/commenters/:kind/:id/comments",
            get(comments::list_commenter_comments),
        )
        .route("/api/comments", axum::routing::post(comments::post_comment))
        .route(
            "/api/comments/:id",
            get(comments::show_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/api/comments/:id/replies",
            get(comments::list_replies).post(comments::post_reply),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::comments::PRINCIPAL_HEADER;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use ::comments::{CommentService, TableRegistry};
    use domain::{Comment, CommentsConfig, TableName};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use storage::Db;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    async fn app(config: CommentsConfig) -> Router {
        let db = Db::new("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT NOT NULL)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO posts (id, title) VALUES (1, 'Hello')")
            .execute(db.pool())
            .await
            .unwrap();

        let registry = TableRegistry::new().register("posts", TableName::new("posts").unwrap());
        let (tx_events, _) = broadcast::channel(16);
        let service = CommentService::new(db, config, Arc::new(registry), Arc::new(tx_events.clone()));
        build_router(
            AppState {
                service: Arc::new(service),
                tx_events,
            },
            "*",
        )
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        principal: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(p) = principal {
            builder = builder.header(PRINCIPAL_HEADER, p);
        }
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_comment_flow_over_http() {
        let app = app(CommentsConfig::default()).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/comments",
            Some("users:1"),
            Some(json!({ "commentable_type": "posts", "commentable_id": 1, "message": "first!" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Comment = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.body, "first!");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/comments/{}", created.id),
            Some("users:2"),
            Some(json!({ "message": "not yours" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/comments/{}/replies", created.id),
            Some("users:2"),
            Some(json!({ "message": "welcome" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let reply: Comment = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply.parent_id, Some(created.id));

        let (status, body) = send(&app, "GET", "/api/commentables/posts/1/comments", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.len(), 2);

        let (status, body) = send(&app, "GET", "/api/commenters/users/2/comments", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let by_bob: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(by_bob.len(), 1);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/comments/{}", created.id),
            Some("users:1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/api/comments/{}", reply.id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app(CommentsConfig::default()).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/comments",
            None,
            Some(json!({ "commentable_type": "posts", "commentable_id": 1, "message": "hi", "guest_name": "Ada" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/comments",
            Some("users:1"),
            Some(json!({ "commentable_type": "posts", "commentable_id": 404, "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/comments",
            Some("nonsense"),
            Some(json!({ "commentable_type": "posts", "commentable_id": 1, "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "DELETE", "/api/comments/1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_approval_filter_on_listing() {
        let app = app(CommentsConfig {
            approval_required: true,
            ..CommentsConfig::default()
        })
        .await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/comments",
            None,
            Some(json!({
                "commentable_type": "posts",
                "commentable_id": 1,
                "message": "held for review",
                "guest_name": "Ada",
                "guest_email": "ada@example.org"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, "GET", "/api/commentables/posts/1/comments?approved=true", None, None).await;
        let approved: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert!(approved.is_empty());

        let (_, body) = send(&app, "GET", "/api/commentables/posts/1/comments?approved=false", None, None).await;
        let pending: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_guest());
    }
}
