//! Controladores
//!
//! Traducen DTOs HTTP a llamadas de los servicios del núcleo.

pub mod maintenance_controller;
pub mod trip_controller;
pub mod vehicle_controller;
