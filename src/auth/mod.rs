//! Authentication Module
//! Mission: Secure API access with JWT tokens and ownership-based authorization

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::Identity;
pub use password::{BcryptHasher, CredentialHasher};
