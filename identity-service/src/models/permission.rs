//! Permission model - named grants attached to roles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Permission names with this prefix grant administration of a service.
pub const ADMIN_PERMISSION_PREFIX: &str = "admin_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// The administered service, e.g. `billing` for `admin_billing`.
    pub fn admin_service(&self) -> Option<&str> {
        self.name
            .strip_prefix(ADMIN_PERMISSION_PREFIX)
            .filter(|service| !service.is_empty())
    }
}

/// Role to permission association row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

impl RolePermission {
    pub fn new(role_id: Uuid, permission_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role_id,
            permission_id,
        }
    }
}
