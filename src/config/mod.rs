//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y las políticas de negocio de la flota.

pub mod database;
pub mod environment;
pub mod policy;

pub use environment::*;
pub use policy::*;
