use crate::domain::value_objects::{Role, UserId};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, header::HeaderMap, request::Parts},
};
use std::str::FromStr;
use uuid::Uuid;

/// 利用者ID用ヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";

/// ロール用ヘッダー
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 認証済みの呼び出し元
///
/// 認証はコラボレーター（ゲートウェイ）の責務。本サービスは
/// 検証済みのヘッダーを信頼済み入力として受け取る。
/// ヘッダーが欠落・不正な場合は401を返す。
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

fn parse_identity(headers: &HeaderMap) -> Result<Identity, &'static str> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing x-user-id header")?;
    let user_id = Uuid::parse_str(user_id).map_err(|_| "Invalid x-user-id header")?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing x-user-role header")?;
    let role = Role::from_str(role).map_err(|_| "Invalid x-user-role header")?;

    Ok(Identity {
        user_id: UserId::from_uuid(user_id),
        role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_identity(&parts.headers).map_err(|message| (StatusCode::UNAUTHORIZED, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user_id: &str, role: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id).unwrap());
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        headers
    }

    #[test]
    fn test_parse_identity_success() {
        let user_id = Uuid::new_v4();
        let identity = parse_identity(&headers(&user_id.to_string(), "librarian")).unwrap();
        assert_eq!(identity.user_id.value(), user_id);
        assert_eq!(identity.role, Role::Librarian);
        assert!(identity.role.is_staff());
    }

    #[test]
    fn test_parse_identity_rejects_missing_headers() {
        assert!(parse_identity(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_parse_identity_rejects_invalid_values() {
        assert!(parse_identity(&headers("not-a-uuid", "user")).is_err());
        assert!(parse_identity(&headers(&Uuid::new_v4().to_string(), "superuser")).is_err());
    }
}
