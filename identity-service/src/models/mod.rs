pub mod permission;
pub mod role;
pub mod user;

pub use permission::{Permission, RolePermission, ADMIN_PERMISSION_PREFIX};
pub use role::{Role, UserRole};
pub use user::{Specification, User, UserProfileUpdate, UserResponse};
