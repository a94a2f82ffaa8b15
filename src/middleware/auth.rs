//! Autenticación JWT
//!
//! Extractor que verifica el token Bearer emitido por la capa de
//! autenticación y entrega al núcleo la identidad `Actor`.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::{Actor, UserRole},
    state::AppState,
    utils::{
        errors::{forbidden_error, AppError, AppResult},
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Usuario autenticado que se inyecta en los handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }

    /// Rechaza con 403 si el usuario no es admin
    pub fn require_admin(&self) -> AppResult<()> {
        match self.role {
            UserRole::Admin => Ok(()),
            UserRole::Driver => Err(forbidden_error("perform this operation", "admin role required")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

        let token = extract_token_from_header(auth_header)?;
        let actor = verify_token(token, &state.jwt)?.actor()?;
        debug!("🔐 Usuario autenticado: {} ({})", actor.user_id, actor.role.as_str());

        Ok(Self {
            user_id: actor.user_id,
            role: actor.role,
        })
    }
}
