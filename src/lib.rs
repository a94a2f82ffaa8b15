//! Fleet manager
//!
//! Núcleo de reglas de una flota de camiones y remolques: registro de
//! vehículos, mantenimiento, disponibilidad y libro de viajes, expuesto
//! mediante una API HTTP con axum.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
