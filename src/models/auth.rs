use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Driver,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Driver => "driver",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "driver" => Some(UserRole::Driver),
            _ => None,
        }
    }
}

/// Identidad autenticada que recibe el núcleo en cada operación.
/// La capa de autenticación es la responsable de emitirla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: UserRole::Admin }
    }

    pub fn driver(user_id: Uuid) -> Self {
        Self { user_id, role: UserRole::Driver }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
