//! Derivation of administrative capabilities from the role/permission graph.
//!
//! The result is a `BTreeSet`, so it is deduplicated and its iteration order
//! depends only on the set contents, never on the order of the input rows.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::models::{Permission, Role, RolePermission, UserRole};

/// Resolve the admin services granted to `user_id`.
///
/// Every role assigned to the user contributes: permissions are unioned
/// across all of them. Assignments to other users are ignored.
///
/// An assignment reaches permissions through its role id alone; `_roles` is
/// not consulted, so a missing role row does not hide its grants.
pub fn resolve_admin_services(
    user_roles: &[UserRole],
    _roles: &[Role],
    role_permissions: &[RolePermission],
    permissions: &[Permission],
    user_id: Uuid,
) -> BTreeSet<String> {
    let mut permissions_by_role: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for rp in role_permissions {
        permissions_by_role
            .entry(rp.role_id)
            .or_default()
            .push(rp.permission_id);
    }

    let permissions_by_id: HashMap<Uuid, &Permission> =
        permissions.iter().map(|p| (p.id, p)).collect();

    user_roles
        .iter()
        .filter(|ur| ur.user_id == user_id)
        .filter_map(|ur| permissions_by_role.get(&ur.role_id))
        .flatten()
        .filter_map(|permission_id| permissions_by_id.get(permission_id))
        .filter_map(|permission| permission.admin_service())
        .map(str::to_string)
        .collect()
}
