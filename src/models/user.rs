//! Credential records, roles and the authenticated principal

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Permission grant attached to a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    /// Accepts `USER` as well as the prefixed `ROLE_USER` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        match name.strip_prefix("ROLE_").unwrap_or(&name) {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Parse a comma separated role column (`"USER,ADMIN"`)
pub fn parse_roles(column: &str) -> Result<BTreeSet<Role>, String> {
    column
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Inverse of [`parse_roles`]
pub fn format_roles(roles: &BTreeSet<Role>) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
}

/// Stored login credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

/// Credential to be inserted; the hash is computed by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub username: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

/// Authenticated caller, attached to request extensions by the access policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl From<Credential> for Principal {
    fn from(credential: Credential) -> Self {
        Self {
            username: credential.username,
            roles: credential.roles,
        }
    }
}

/// Claims carried by the login-form session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub roles: Vec<Role>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            self,
            &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let token_data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            username: claims.sub,
            roles: claims.roles.into_iter().collect(),
        }
    }
}
