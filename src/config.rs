//! Runtime configuration
//! Mission: Turn CLI flags and environment into one validated `Config`
//!
//! Every flag can also be supplied through the environment (and therefore a
//! `.env` file). The token signing secret has no default.

use crate::store::seed::BootstrapAdmin;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// HS256 keys shorter than the hash output weaken the signature.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// bcrypt's accepted work-factor range.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Parser, Debug)]
#[command(name = "todolist")]
#[command(about = "Multi-tenant to-do list API server")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "TODO_BIND", default_value = "0.0.0.0:5011")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "TODO_DATABASE_PATH", default_value = "todolist.db")]
    pub database_path: PathBuf,

    /// Token signing secret (at least 32 bytes)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "TODO_TOKEN_TTL_HOURS", default_value = "168")]
    pub token_ttl_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "TODO_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Username of the admin created when the store has no users
    #[arg(long, env = "TODO_ADMIN_USERNAME", requires = "admin_password")]
    pub admin_username: Option<String>,

    /// Password of the bootstrap admin
    #[arg(long, env = "TODO_ADMIN_PASSWORD", hide_env_values = true, requires = "admin_username")]
    pub admin_password: Option<String>,

    /// Display name of the bootstrap admin
    #[arg(long, env = "TODO_ADMIN_NAME", default_value = "Administrator")]
    pub admin_name: String,

    /// Seed demo users, lists and items into an empty store
    #[arg(long, env = "TODO_SEED_DEMO")]
    pub seed_demo: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET is required")]
    MissingJwtSecret,
    #[error("JWT_SECRET must be at least {min} bytes, got {0}", min = MIN_JWT_SECRET_LEN)]
    WeakJwtSecret(usize),
    #[error("token lifetime must be between 1h and the representable maximum, got {0}h")]
    InvalidTokenTtl(i64),
    #[error("bcrypt cost must be between {min} and {max}, got {0}", min = MIN_BCRYPT_COST, max = MAX_BCRYPT_COST)]
    InvalidBcryptCost(u32),
    #[error("bootstrap admin password must not be empty")]
    EmptyAdminPassword,
}

/// Validated configuration injected at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: Vec<u8>,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let secret = args.jwt_secret.ok_or(ConfigError::MissingJwtSecret)?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakJwtSecret(secret.len()));
        }

        let token_ttl = Some(args.token_ttl_hours)
            .filter(|hours| *hours > 0)
            .and_then(chrono::Duration::try_hours)
            .ok_or(ConfigError::InvalidTokenTtl(args.token_ttl_hours))?;

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&args.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(args.bcrypt_cost));
        }

        let bootstrap_admin = match (args.admin_username, args.admin_password) {
            (Some(_), Some(password)) if password.is_empty() => {
                return Err(ConfigError::EmptyAdminPassword)
            }
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                name: args.admin_name,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            bind: args.bind,
            database_path: args.database_path,
            jwt_secret: secret.into_bytes(),
            token_ttl,
            bcrypt_cost: args.bcrypt_cost,
            bootstrap_admin,
            seed_demo: args.seed_demo,
        })
    }
}
