use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error};
use uuid::Uuid;

use super::{ChangeSet, FleetRepository, MaintenanceFilter, Staged, TripFilter};
use crate::models::{
    MaintenanceObligation, MaintenanceStatus, MaintenanceType, MaintenanceWatermarks, Trip,
    TripStatus, Vehicle, VehicleKind, VehicleStatus,
};
use crate::utils::errors::{AppError, AppResult};

// Filas tal como viven en PostgreSQL
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    kind: VehicleKind,
    plate: String,
    brand: String,
    model: String,
    status: VehicleStatus,
    current_odometer: i64,
    initial_odometer: i64,
    acquired_at: NaiveDate,
    last_oil_change_odometer: Option<i64>,
    last_oil_change_date: Option<DateTime<Utc>>,
    last_inspection_date: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        let watermarks = match (
            row.kind,
            row.last_oil_change_odometer,
            row.last_oil_change_date,
            row.last_inspection_date,
        ) {
            (VehicleKind::Truck, Some(odometer), Some(oil_date), Some(inspection_date)) => {
                Some(MaintenanceWatermarks {
                    last_oil_change_odometer: odometer,
                    last_oil_change_date: oil_date,
                    last_inspection_date: inspection_date,
                })
            }
            _ => None,
        };

        Self {
            id: row.id,
            kind: row.kind,
            plate: row.plate,
            brand: row.brand,
            model: row.model,
            status: row.status,
            current_odometer: row.current_odometer,
            initial_odometer: row.initial_odometer,
            acquired_at: row.acquired_at,
            watermarks,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    truck_id: Uuid,
    trailer_id: Option<Uuid>,
    driver_id: Uuid,
    start_location: String,
    end_location: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: TripStatus,
    start_odometer: Option<i64>,
    end_odometer: Option<i64>,
    fuel_used: Option<f64>,
    fuel_cost: Option<Decimal>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Self {
            id: row.id,
            truck_id: row.truck_id,
            trailer_id: row.trailer_id,
            driver_id: row.driver_id,
            start_location: row.start_location,
            end_location: row.end_location,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status,
            start_odometer: row.start_odometer,
            end_odometer: row.end_odometer,
            fuel_used: row.fuel_used,
            fuel_cost: row.fuel_cost,
            notes: row.notes,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MaintenanceRow {
    id: Uuid,
    target_id: Uuid,
    target_model: VehicleKind,
    maintenance_type: MaintenanceType,
    status: MaintenanceStatus,
    scheduled_date: DateTime<Utc>,
    completed_date: Option<DateTime<Utc>>,
    cost: Option<Decimal>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MaintenanceRow> for MaintenanceObligation {
    fn from(row: MaintenanceRow) -> Self {
        Self {
            id: row.id,
            target_id: row.target_id,
            target_model: row.target_model,
            maintenance_type: row.maintenance_type,
            status: row.status,
            scheduled_date: row.scheduled_date,
            completed_date: row.completed_date,
            cost: row.cost,
            notes: row.notes,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Traduce violaciones de unicidad y de referencia a `Conflict`;
/// el resto es fallo de almacenamiento
fn map_write_error(context: &str, e: sqlx::Error) -> AppError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());
    match code.as_deref() {
        Some("23505") => {
            return AppError::Conflict(format!("{}: duplicate value", context));
        }
        Some("23503") => {
            return AppError::Conflict(format!("{}: still referenced by other records", context));
        }
        _ => {}
    }
    error!("❌ Error escribiendo {}: {}", context, e);
    AppError::StorageUnavailable(format!("Error writing {}: {}", context, e))
}

fn stale(resource: &str, id: Uuid) -> AppError {
    AppError::Conflict(format!(
        "{} '{}' was modified concurrently or no longer exists",
        resource, id
    ))
}

pub struct PgFleetRepository {
    pool: PgPool,
}

impl PgFleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_vehicle(
        tx: &mut Transaction<'_, Postgres>,
        staged: &Staged<Vehicle>,
    ) -> AppResult<()> {
        let v = staged.record();
        let w = v.watermarks.as_ref();
        let sql = match staged {
            Staged::Insert(_) => {
                r#"
                INSERT INTO vehicles (id, kind, plate, brand, model, status, current_odometer,
                    initial_odometer, acquired_at, last_oil_change_odometer, last_oil_change_date,
                    last_inspection_date, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#
            }
            Staged::Update(_) => {
                r#"
                UPDATE vehicles
                SET kind = $2, plate = $3, brand = $4, model = $5, status = $6,
                    current_odometer = $7, initial_odometer = $8, acquired_at = $9,
                    last_oil_change_odometer = $10, last_oil_change_date = $11,
                    last_inspection_date = $12, version = $13, updated_at = $15
                WHERE id = $1 AND version = $13 - 1 AND created_at = $14
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(v.id)
            .bind(v.kind)
            .bind(&v.plate)
            .bind(&v.brand)
            .bind(&v.model)
            .bind(v.status)
            .bind(v.current_odometer)
            .bind(v.initial_odometer)
            .bind(v.acquired_at)
            .bind(w.map(|w| w.last_oil_change_odometer))
            .bind(w.map(|w| w.last_oil_change_date))
            .bind(w.map(|w| w.last_inspection_date))
            .bind(v.version)
            .bind(v.created_at)
            .bind(v.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error("vehicle", e))?;

        if result.rows_affected() == 0 {
            return Err(stale("Vehicle", v.id));
        }
        Ok(())
    }

    async fn write_trip(tx: &mut Transaction<'_, Postgres>, staged: &Staged<Trip>) -> AppResult<()> {
        let t = staged.record();
        let sql = match staged {
            Staged::Insert(_) => {
                r#"
                INSERT INTO trips (id, truck_id, trailer_id, driver_id, start_location, end_location,
                    start_date, end_date, status, start_odometer, end_odometer, fuel_used, fuel_cost,
                    notes, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                "#
            }
            Staged::Update(_) => {
                r#"
                UPDATE trips
                SET truck_id = $2, trailer_id = $3, driver_id = $4, start_location = $5,
                    end_location = $6, start_date = $7, end_date = $8, status = $9,
                    start_odometer = $10, end_odometer = $11, fuel_used = $12, fuel_cost = $13,
                    notes = $14, version = $15, updated_at = $17
                WHERE id = $1 AND version = $15 - 1 AND created_at = $16
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(t.id)
            .bind(t.truck_id)
            .bind(t.trailer_id)
            .bind(t.driver_id)
            .bind(&t.start_location)
            .bind(&t.end_location)
            .bind(t.start_date)
            .bind(t.end_date)
            .bind(t.status)
            .bind(t.start_odometer)
            .bind(t.end_odometer)
            .bind(t.fuel_used)
            .bind(t.fuel_cost)
            .bind(&t.notes)
            .bind(t.version)
            .bind(t.created_at)
            .bind(t.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error("trip", e))?;

        if result.rows_affected() == 0 {
            return Err(stale("Trip", t.id));
        }
        Ok(())
    }

    async fn write_maintenance(
        tx: &mut Transaction<'_, Postgres>,
        staged: &Staged<MaintenanceObligation>,
    ) -> AppResult<()> {
        let m = staged.record();
        let sql = match staged {
            Staged::Insert(_) => {
                r#"
                INSERT INTO maintenance (id, target_id, target_model, maintenance_type, status,
                    scheduled_date, completed_date, cost, notes, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#
            }
            Staged::Update(_) => {
                r#"
                UPDATE maintenance
                SET target_id = $2, target_model = $3, maintenance_type = $4, status = $5,
                    scheduled_date = $6, completed_date = $7, cost = $8, notes = $9,
                    version = $10, updated_at = $12
                WHERE id = $1 AND version = $10 - 1 AND created_at = $11
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(m.id)
            .bind(m.target_id)
            .bind(m.target_model)
            .bind(m.maintenance_type)
            .bind(m.status)
            .bind(m.scheduled_date)
            .bind(m.completed_date)
            .bind(m.cost)
            .bind(&m.notes)
            .bind(m.version)
            .bind(m.created_at)
            .bind(m.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error("maintenance", e))?;

        if result.rows_affected() == 0 {
            return Err(stale("Maintenance", m.id));
        }
        Ok(())
    }
}

#[async_trait]
impl FleetRepository for PgFleetRepository {
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE plate = $1")
            .bind(plate)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn list_vehicles(&self, kind: Option<VehicleKind>) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE ($1::vehicle_kind IS NULL OR kind = $1) ORDER BY created_at DESC",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Trip::from))
    }

    async fn list_trips(&self, filter: &TripFilter) -> AppResult<Vec<Trip>> {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT * FROM trips
            WHERE ($1::uuid IS NULL OR driver_id = $1)
              AND ($2::uuid IS NULL OR truck_id = $2 OR trailer_id = $2)
              AND (cardinality($3::text[]) = 0 OR status::text = ANY($3))
            ORDER BY start_date DESC
            "#,
        )
        .bind(filter.driver_id)
        .bind(filter.vehicle_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceObligation>> {
        let row = sqlx::query_as::<_, MaintenanceRow>("SELECT * FROM maintenance WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MaintenanceObligation::from))
    }

    async fn list_maintenance(
        &self,
        filter: &MaintenanceFilter,
    ) -> AppResult<Vec<MaintenanceObligation>> {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query_as::<_, MaintenanceRow>(
            r#"
            SELECT * FROM maintenance
            WHERE ($1::uuid IS NULL OR target_id = $1)
              AND (cardinality($2::text[]) = 0 OR status::text = ANY($2))
            ORDER BY scheduled_date DESC
            "#,
        )
        .bind(filter.target_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MaintenanceObligation::from).collect())
    }

    async fn commit(&self, changes: ChangeSet) -> AppResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Un error en cualquier escritura descarta la transacción completa al soltar `tx`
        let mut tx = self.pool.begin().await?;

        for staged in &changes.vehicles {
            Self::write_vehicle(&mut tx, staged).await?;
        }
        for staged in &changes.trips {
            Self::write_trip(&mut tx, staged).await?;
        }
        for staged in &changes.maintenance {
            Self::write_maintenance(&mut tx, staged).await?;
        }
        for id in &changes.deleted_trips {
            sqlx::query("DELETE FROM trips WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error("trip", e))?;
        }
        for id in &changes.deleted_vehicles {
            sqlx::query("DELETE FROM vehicles WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error("vehicle", e))?;
        }

        tx.commit().await?;
        debug!(
            "💾 Commit PostgreSQL: {} vehículos, {} viajes, {} mantenimientos",
            changes.vehicles.len(),
            changes.trips.len(),
            changes.maintenance.len()
        );
        Ok(())
    }
}
