use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::auth::Claims,
    entity::Users,
    error::{AppError, AppResult},
    models::Role,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// What an operation needs the caller to be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageCatalog,
    ManageOrders,
    ManageUsers,
    /// Act on resources owned by the given user.
    ActFor(Uuid),
}

/// The one authorization check every workflow operation goes through.
/// Admins hold every capability; clients may only act for themselves.
pub fn authorize(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if user.role == Role::Admin {
        return Ok(());
    }
    match capability {
        Capability::ActFor(owner) if owner == user.user_id => Ok(()),
        Capability::ActFor(_) => Err(AppError::Unauthorized(
            "cannot act on another user's resources".into(),
        )),
        _ => Err(AppError::Unauthorized("admin access required".into())),
    }
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))?;
    Ok(decoded.claims)
}

/// Loads the caller's current role; tokens of deleted users stop working.
pub async fn resolve_user(orm: &OrmConn, user_id: Uuid) -> AppResult<AuthUser> {
    let user = Users::find_by_id(user_id)
        .one(orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;
    let role = user
        .role
        .parse::<Role>()
        .map_err(AppError::Unauthorized)?;
    Ok(AuthUser { user_id, role })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("invalid Authorization scheme".into()))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid user id in token".into()))?;

        resolve_user(&state.orm, user_id).await
    }
}
