//! Authentication: password verification, session tokens and the route gate.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{bearer_token, require_admin, AdminSession, AppState};
pub use password::{SecretHasher, WorkFactor};
pub use token::{IssuedToken, SessionClaims, TokenService};
