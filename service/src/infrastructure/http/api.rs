use axum::http::StatusCode;
use axum::Json;
use axum::response::{IntoResponse, Response};
use folio_common::GatewayError;
use serde::Serialize;

use crate::domain::autosave::SaveError;

// ApiSucess is a wrapper around a response that includes a status code.

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ApiError is a wrapper around a response that includes a status code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadGateway(String),
    NotFound,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::NotFound => Self::NotFound,
            GatewayError::Rejected { status, message } => {
                tracing::warn!("article store rejected request with {}: {}", status, message);
                Self::BadGateway(message)
            }
            other => {
                tracing::error!("{}", other);
                Self::BadGateway("Article store is unavailable".to_string())
            }
        }
    }
}

impl From<SaveError> for ApiError {
    fn from(value: SaveError) -> Self {
        match value {
            SaveError::Ineligible(_) => Self::UnprocessableEntity(value.to_string()),
            // 404 is reserved for unknown sessions here
            SaveError::Gateway(GatewayError::NotFound) => {
                tracing::warn!("stored article vanished during an explicit save");
                Self::BadGateway("Article no longer exists in the article store".to_string())
            }
            SaveError::Gateway(cause) => Self::from(cause),
            SaveError::Closed => Self::NotFound,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        match self {
            InternalServerError(e) => {
                tracing::error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponseBody::new_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )),
                )
                    .into_response()
            }
            UnprocessableEntity(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponseBody::new_error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    message,
                )),
            )
                .into_response(),
            BadGateway(message) => (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponseBody::new_error(StatusCode::BAD_GATEWAY, message)),
            )
                .into_response(),
            NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

// Generic response structure shared by all API responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    pub status_code: u16,
    pub data: T,
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

/// The response data format for all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
