//! Configuración de conexión a PostgreSQL
//!
//! Este módulo maneja el ciclo de vida del pool: apertura al arrancar,
//! migraciones y cierre en el apagado ordenado.

use sqlx::PgPool;
use tracing::info;

use crate::config::database::{mask_database_url, DatabaseConfig};
use crate::utils::errors::AppResult;

/// Conexión compartida con la base de datos
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Abrir el pool de conexiones
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!("🔌 Conectando a la base de datos: {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;
        info!("✅ Pool de conexiones listo (máx. {})", config.max_connections);
        Ok(Self { pool })
    }

    /// Ejecutar migraciones pendientes
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("📦 Migraciones aplicadas");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cerrar todas las conexiones
    pub async fn close(&self) {
        self.pool.close().await;
        info!("🔌 Pool de conexiones cerrado");
    }
}
