pub mod auth;
pub mod user;

pub use auth::{login, register};
pub use user::{get_me, get_user_by_id, get_user_properties, get_user_roles, update_user_info};
