pub mod auth;
pub mod require_role;
pub mod response;
pub mod validate_user;

pub use auth::{bearer_token, jwt_auth_middleware, AuthUser};
pub use require_role::{require_roles, ADMIN_ROLES, MANAGER_ROLES};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::{load_viewer, validate_user_middleware, Viewer};
