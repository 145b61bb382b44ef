//! Session extraction from request headers.
//!
//! Authentication happens upstream; the authenticated identity arrives as
//! headers and is turned into an explicit [`Session`] for the handler.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::Response,
};
use shared::Role;
use uuid::Uuid;

use crate::backend::domain::models::Session;
use crate::backend::io::rest::error::error_response;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn session_from_headers(headers: &HeaderMap) -> Result<Session, Response> {
    let user_id = header(headers, USER_ID_HEADER)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Sesión requerida"))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| error_response(StatusCode::UNAUTHORIZED, "Identificador de usuario no válido"))?;

    let role = match header(headers, USER_ROLE_HEADER) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?,
        None => Role::Viewer,
    };

    Ok(Session {
        user_id,
        role,
        name: header(headers, USER_NAME_HEADER).map(str::to_string),
        email: header(headers, USER_EMAIL_HEADER).map(str::to_string),
    })
}
