//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::services::FleetServices;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub services: FleetServices,
}

impl AppState {
    pub fn new(jwt: JwtConfig, services: FleetServices) -> Self {
        Self {
            jwt: Arc::new(jwt),
            services,
        }
    }
}
