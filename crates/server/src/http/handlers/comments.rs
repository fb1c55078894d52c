use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use comments::{CommentError, CommentService, Commentable, Commenter};
use domain::{Comment, MorphRef, StoreComment};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

/// Header the host's auth layer sets to `<type>:<id>` for signed-in principals.
pub const PRINCIPAL_HEADER: &str = "X-Commenter";

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub approved: Option<bool>,
}

fn into_status(err: CommentError) -> (StatusCode, String) {
    let status = match &err {
        CommentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CommentError::Authorization(_) => StatusCode::FORBIDDEN,
        CommentError::NotFound(_) => StatusCode::NOT_FOUND,
        CommentError::Persistence(_) | CommentError::Hook { .. } => {
            tracing::error!("Comment operation failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn principal_from(headers: &HeaderMap) -> ApiResult<Option<MorphRef>> {
    let Some(raw) = headers.get(PRINCIPAL_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid principal header".to_string()))?;
    raw.parse::<MorphRef>()
        .map(Some)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn require_principal(headers: &HeaderMap) -> ApiResult<MorphRef> {
    principal_from(headers)?.ok_or((
        StatusCode::UNAUTHORIZED,
        format!("Missing {} header", PRINCIPAL_HEADER),
    ))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let target = MorphRef::new(kind, id);
    let repo = state.service.repo();
    let comments = match query.approved {
        Some(approved) => Commentable::approved_comments(&target, repo, approved).await,
        None => Commentable::comments(&target, repo).await,
    }
    .map_err(into_status)?;

    Ok(Json(comments))
}

pub async fn list_commenter_comments(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let who = MorphRef::new(kind, id);
    let comments = Commenter::approved_comments(&who, state.service.repo(), query.approved)
        .await
        .map_err(into_status)?;

    Ok(Json(comments))
}

pub async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StoreComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let principal = principal_from(&headers)?;
    let comment = state
        .service
        .store(principal.as_ref(), payload)
        .await
        .map_err(into_status)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn show_comment(
    State(service): State<Arc<CommentService>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Comment>> {
    let comment = service.find(id).await.map_err(into_status)?;
    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<MessageRequest>,
) -> ApiResult<Json<Comment>> {
    let principal = require_principal(&headers)?;
    let comment = state.service.find(id).await.map_err(into_status)?;
    let updated = state
        .service
        .update(&principal, &comment, &payload.message)
        .await
        .map_err(into_status)?;

    Ok(Json(updated))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let principal = require_principal(&headers)?;
    let comment = state.service.find(id).await.map_err(into_status)?;
    state
        .service
        .destroy(&principal, &comment)
        .await
        .map_err(into_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_replies(
    State(service): State<Arc<CommentService>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comment = service.find(id).await.map_err(into_status)?;
    let replies = service.replies(&comment).await.map_err(into_status)?;
    Ok(Json(replies))
}

pub async fn post_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<MessageRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let principal = require_principal(&headers)?;
    let parent = state.service.find(id).await.map_err(into_status)?;
    let reply = state
        .service
        .reply(&principal, &parent, &payload.message)
        .await
        .map_err(into_status)?;

    Ok((StatusCode::CREATED, Json(reply)))
}
