//! Políticas de negocio de la flota
//!
//! Umbrales ajustables. Hay dos umbrales de cambio de aceite independientes:
//! uno dispara el mantenimiento automático y el otro solo alimenta el
//! reporte de alertas.

use anyhow::Result;

use super::environment::parse_var;

/// Política del camino automático (actualización de odómetro)
#[derive(Debug, Clone, PartialEq)]
pub struct AutoSchedulingPolicy {
    pub oil_change_interval_km: i64,
}

impl Default for AutoSchedulingPolicy {
    fn default() -> Self {
        Self { oil_change_interval_km: 10_000 }
    }
}

/// Política del reporte de alertas de mantenimiento
#[derive(Debug, Clone, PartialEq)]
pub struct AlertReportingPolicy {
    pub oil_change_km: i64,
    pub oil_change_days: i64,
    pub oil_change_high_km: i64,
    pub oil_change_high_days: i64,
    pub inspection_days: i64,
    pub inspection_high_days: i64,
}

impl Default for AlertReportingPolicy {
    fn default() -> Self {
        Self {
            oil_change_km: 15_000,
            oil_change_days: 180,
            oil_change_high_km: 18_000,
            oil_change_high_days: 210,
            inspection_days: 365,
            inspection_high_days: 400,
        }
    }
}

/// Rango plausible de consumo en L/100km; protege contra errores de captura
#[derive(Debug, Clone, PartialEq)]
pub struct FuelPlausibilityPolicy {
    pub min_l_per_100km: f64,
    pub max_l_per_100km: f64,
}

impl Default for FuelPlausibilityPolicy {
    fn default() -> Self {
        Self { min_l_per_100km: 10.0, max_l_per_100km: 100.0 }
    }
}

impl FuelPlausibilityPolicy {
    pub fn contains(&self, consumption: f64) -> bool {
        consumption >= self.min_l_per_100km && consumption <= self.max_l_per_100km
    }
}

/// Reglas de creación de viajes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripCreationPolicy {
    /// Verificar también la disponibilidad del remolque al crear un viaje
    pub check_trailer_availability: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetPolicies {
    pub auto_scheduling: AutoSchedulingPolicy,
    pub alert_reporting: AlertReportingPolicy,
    pub fuel_plausibility: FuelPlausibilityPolicy,
    pub trip_creation: TripCreationPolicy,
}

impl FleetPolicies {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            auto_scheduling: AutoSchedulingPolicy {
                oil_change_interval_km: parse_var(
                    "OIL_CHANGE_INTERVAL_KM",
                    defaults.auto_scheduling.oil_change_interval_km,
                )?,
            },
            alert_reporting: defaults.alert_reporting,
            fuel_plausibility: FuelPlausibilityPolicy {
                min_l_per_100km: parse_var(
                    "FUEL_MIN_L_PER_100KM",
                    defaults.fuel_plausibility.min_l_per_100km,
                )?,
                max_l_per_100km: parse_var(
                    "FUEL_MAX_L_PER_100KM",
                    defaults.fuel_plausibility.max_l_per_100km,
                )?,
            },
            trip_creation: TripCreationPolicy {
                check_trailer_availability: parse_var("CHECK_TRAILER_AVAILABILITY", false)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let policies = FleetPolicies::default();
        assert_eq!(policies.auto_scheduling.oil_change_interval_km, 10_000);
        assert_eq!(policies.alert_reporting.oil_change_km, 15_000);
        assert_eq!(policies.alert_reporting.inspection_high_days, 400);
        assert!(!policies.trip_creation.check_trailer_availability);
    }

    #[test]
    fn test_fuel_range_is_inclusive() {
        let fuel = FuelPlausibilityPolicy::default();
        assert!(fuel.contains(10.0));
        assert!(fuel.contains(100.0));
        assert!(!fuel.contains(9.99));
        assert!(!fuel.contains(200.0));
    }
}
