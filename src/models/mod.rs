//! Modelos del sistema
//!
//! Este módulo contiene las entidades de la flota: vehículos, viajes y
//! obligaciones de mantenimiento, junto con la identidad del actor.

pub mod auth;
pub mod maintenance;
pub mod trip;
pub mod vehicle;

pub use auth::{Actor, UserRole};
pub use maintenance::*;
pub use trip::*;
pub use vehicle::*;
