use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use folio_common::{ArticleId, ArticleStatus, FieldValue};

use crate::domain::AppState;
use crate::domain::sessions::SessionId;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::sessions::dto::{
    OpenSessionRequest, SavedArticleResponse, SessionResponse,
};

mod dto;

fn parse_session_id(session_id: &str) -> Result<SessionId, ApiError> {
    SessionId::try_from(session_id).map_err(|err| ApiError::UnprocessableEntity(err.to_string()))
}

pub async fn open_session<S: AppState>(
    State(state): State<S>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let (session_id, session) = match request.article_id {
        None => state.sessions().open_new(),
        Some(id) => {
            let id = ArticleId::try_new(id)
                .map_err(|err| ApiError::UnprocessableEntity(err.to_string()))?;
            state.sessions().open_existing(id).await?
        }
    };

    let response = SessionResponse::from((session_id, session.snapshot()));
    Ok(ApiSuccess::new(StatusCode::CREATED, response))
}

pub async fn get_session<S: AppState>(
    Path(session_id): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = state.sessions().get(&session_id).ok_or(ApiError::NotFound)?;

    let response = SessionResponse::from((session_id, session.snapshot()));
    Ok(ApiSuccess::new(StatusCode::OK, response))
}

pub async fn set_field<S: AppState>(
    Path(session_id): Path<String>,
    State(state): State<S>,
    Json(value): Json<FieldValue>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = state.sessions().get(&session_id).ok_or(ApiError::NotFound)?;

    session.set_field(value);

    let response = SessionResponse::from((session_id, session.snapshot()));
    Ok(ApiSuccess::new(StatusCode::ACCEPTED, response))
}

pub async fn save_draft<S: AppState>(
    Path(session_id): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SavedArticleResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = state.sessions().get(&session_id).ok_or(ApiError::NotFound)?;

    let id = session.save_draft().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        SavedArticleResponse::new(id, ArticleStatus::Draft),
    ))
}

pub async fn publish<S: AppState>(
    Path(session_id): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SavedArticleResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = state.sessions().get(&session_id).ok_or(ApiError::NotFound)?;

    let id = session.publish().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        SavedArticleResponse::new(id, ArticleStatus::Published),
    ))
}

pub async fn close_session<S: AppState>(
    Path(session_id): Path<String>,
    State(state): State<S>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    if state.sessions().close(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use axum::response::Response;
    use folio_common::test_utils::RecordingGateway;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::domain::autosave::DelayPolicy;
    use crate::domain::sessions::SessionRegistry;
    use crate::infrastructure::AppStateImpl;
    use crate::infrastructure::http::api_routes;

    use super::*;

    type TestState = AppStateImpl<RecordingGateway>;

    fn router() -> (Router, TestState) {
        let sessions = SessionRegistry::new(
            RecordingGateway::new(),
            DelayPolicy::default(),
            Duration::from_secs(60),
        );
        let state = AppStateImpl::new(Arc::new(sessions));
        (api_routes::<TestState>().with_state(state.clone()), state)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/sessions", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["sessionId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn test_field_edit_is_accepted() {
        let (router, _) = router();
        let session_id = open(&router).await;

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                &format!("/sessions/{session_id}/fields"),
                json!({"field": "title", "value": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["draft"]["title"], "Hello");
        assert_eq!(body["revision"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_field_is_rejected() {
        let (router, state) = router();
        let session_id = open(&router).await;

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                &format!("/sessions/{session_id}/fields"),
                json!({"field": "nickname", "value": "x"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let id = SessionId::try_from(session_id.as_str()).unwrap();
        let session = state.sessions().get(&id).unwrap();
        assert_eq!(session.snapshot().revision, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_session_is_not_found() {
        let (router, _) = router();
        let session_id = SessionId::generate();

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                &format!("/sessions/{session_id}/fields"),
                json!({"field": "title", "value": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
