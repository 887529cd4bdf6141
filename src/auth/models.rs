//! Authentication Models
//! Mission: Define token claims and the typed caller identity derived from them

use serde::{Deserialize, Serialize};

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub username: String,
    #[serde(rename = "IsAdmin")]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64, // expiration timestamp
}

/// Authenticated caller, produced once when a token is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl TryFrom<Claims> for Identity {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub is_admin: bool,
}
