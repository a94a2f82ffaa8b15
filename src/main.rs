use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_manager::config::database::DatabaseConfig;
use fleet_manager::config::{EnvironmentConfig, StorageBackend};
use fleet_manager::database::DatabaseConnection;
use fleet_manager::middleware::cors_layer;
use fleet_manager::repositories::{FleetRepository, InMemoryFleetRepository, PgFleetRepository};
use fleet_manager::routes::create_router;
use fleet_manager::services::{FleetEvent, FleetServices};
use fleet_manager::state::AppState;
use fleet_manager::utils::jwt::JwtConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_manager=debug,tower_http=info")),
        )
        .init();

    info!("🚚 Fleet Manager - núcleo de flota");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    info!("🔧 Entorno: {} | almacenamiento: {:?}", config.environment, config.storage_backend);

    let (repository, db_connection): (Arc<dyn FleetRepository>, Option<DatabaseConnection>) =
        match (config.storage_backend, config.database_url.as_deref()) {
            (StorageBackend::Postgres, Some(url)) => {
                let connection = match DatabaseConnection::connect(&DatabaseConfig::new(url)).await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("❌ Error conectando a la base de datos: {}", e);
                        return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                    }
                };
                connection.migrate().await?;
                let repository: Arc<dyn FleetRepository> =
                    Arc::new(PgFleetRepository::new(connection.pool().clone()));
                (repository, Some(connection))
            }
            (StorageBackend::Postgres, None) => {
                return Err(anyhow::anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"));
            }
            (StorageBackend::Memory, _) => {
                if config.is_production() {
                    warn!("⚠️ Almacenamiento en memoria en producción: los datos se pierden al reiniciar");
                }
                let repository: Arc<dyn FleetRepository> = Arc::new(InMemoryFleetRepository::new());
                (repository, None)
            }
        };

    let services = FleetServices::new(repository, config.policies.clone());
    spawn_event_logger(&services);
    if config.maintenance_sweep_interval_secs > 0 {
        spawn_maintenance_sweep(&services, config.maintenance_sweep_interval_secs);
    }

    let state = AppState::new(JwtConfig::from(&config), services);
    let app = create_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("   /api/trips - Viajes");
    info!("   /api/vehicles - Vehículos");
    info!("   /api/maintenance - Mantenimiento");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    if let Some(connection) = db_connection {
        connection.close().await;
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Registra en el log los eventos de dominio
fn spawn_event_logger(services: &FleetServices) {
    let mut receiver = services.events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(FleetEvent::MaintenanceScheduled {
                    obligation_id,
                    vehicle_id,
                    maintenance_type,
                    automatic,
                }) => info!(
                    "🔧 Mantenimiento {} programado ({}) para {} [automático: {}]",
                    obligation_id,
                    maintenance_type.as_str(),
                    vehicle_id,
                    automatic
                ),
                Ok(FleetEvent::MaintenanceCompleted {
                    obligation_id,
                    vehicle_id,
                    maintenance_type,
                }) => info!(
                    "✅ Mantenimiento {} ({}) completado en {}",
                    obligation_id,
                    maintenance_type.as_str(),
                    vehicle_id
                ),
                Ok(FleetEvent::TripCompleted {
                    trip_id,
                    driver_id,
                    truck_id,
                    distance,
                }) => info!(
                    "🏁 Viaje {} completado por {} con {}: {} km",
                    trip_id, driver_id, truck_id, distance
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("⚠️ Logger de eventos retrasado, {} eventos descartados", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Barrido periódico de alertas de mantenimiento
fn spawn_maintenance_sweep(services: &FleetServices, interval_secs: u64) {
    let scheduler = services.scheduler.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match scheduler.vehicles_needing_maintenance().await {
                Ok(reports) => {
                    for report in reports {
                        for alert in report.alerts {
                            warn!("⚠️ {}: {}", report.vehicle.plate, alert.message);
                        }
                    }
                }
                Err(e) => error!("❌ Error en el barrido de mantenimiento: {}", e),
            }
        }
    });
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el manejador de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
