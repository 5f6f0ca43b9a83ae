use crate::application::lending::{ErrorClass, LendingError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Lending(LendingError),
    /// 職員専用エンドポイントへの利用者アクセス
    StaffOnly,
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError::Lending(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::StaffOnly => (
                StatusCode::FORBIDDEN,
                "Access denied. Insufficient permissions.".to_string(),
            ),
            ApiError::Lending(err) => match err.class() {
                // 404 Not Found - リクエストされたリソースが存在しない
                ErrorClass::NotFound => (StatusCode::NOT_FOUND, err.to_string()),

                // 403 Forbidden - 所有者の不一致
                ErrorClass::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),

                // 400 Bad Request - ビジネスルール違反・不正な入力
                ErrorClass::Conflict | ErrorClass::InvalidArgument => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }

                // 500 Internal Server Error - ストレージ障害
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                ErrorClass::Unavailable => {
                    tracing::error!("storage error: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
