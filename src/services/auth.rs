//! Authentication service: HTTP Basic, login-form sessions and account seeding

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::HeaderMap;
use axum_extra::headers::{authorization::Basic, Authorization, Cookie, HeaderMapExt};
use chrono::Utc;
use rand::rngs::OsRng;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::{
    config::{AuthConfig, SeedUser},
    error::{AppError, AppResult},
    models::{
        user::{NewCredential, SessionClaims},
        Principal,
    },
    repository::CredentialStore,
};

/// Name of the cookie set by the login form
pub const SESSION_COOKIE: &str = "ANIME_SESSION";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    config: AuthConfig,
    /// Hash verified for unknown usernames so lookups cost the same either way
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Self {
        Self {
            store,
            config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn realm(&self) -> &str {
        &self.config.realm
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.config.session_ttl_minutes * 60
    }

    /// Resolve the caller from Basic credentials or, failing that, the session cookie
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<Principal> {
        if let Some(Authorization(basic)) = headers.typed_get::<Authorization<Basic>>() {
            return self.authenticate(basic.username(), basic.password()).await;
        }

        if let Some(token) = headers
            .typed_get::<Cookie>()
            .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned))
        {
            return SessionClaims::from_token(&token, &self.config.session_secret)
                .map(Principal::from)
                .map_err(|_| AppError::Authentication("Session expired or invalid".to_string()));
        }

        Err(AppError::Authentication(
            "Full authentication is required to access this resource".to_string(),
        ))
    }

    /// Check a username/password pair against the credential store
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Principal> {
        let credential = self.store.find_by_username(username).await?;
        let hash = match &credential {
            Some(credential) => credential.password_hash.clone(),
            None => self.dummy_hash().await?,
        };

        let password = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))??;

        match credential {
            Some(credential) if valid => Ok(credential.into()),
            _ => {
                tracing::debug!(username, "Rejected credentials");
                Err(invalid_credentials())
            }
        }
    }

    async fn dummy_hash(&self) -> AppResult<String> {
        self.dummy_hash
            .get_or_try_init(|| async {
                tokio::task::spawn_blocking(|| hash_password("unknown-user"))
                    .await
                    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            })
            .await
            .cloned()
    }

    /// Sign a session token for the login form cookie
    pub fn issue_session(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: principal.username.clone(),
            roles: principal.roles.iter().copied().collect(),
            exp: now + self.session_ttl_seconds(),
            iat: now,
        };
        claims
            .create_token(&self.config.session_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create session token: {}", e)))
    }

    /// Insert the configured seed accounts when no credential exists yet
    pub async fn ensure_seed_users(&self) -> AppResult<usize> {
        if self.store.count().await? > 0 {
            return Ok(0);
        }

        for seed in &self.config.seed_users {
            self.create_user(seed).await?;
            tracing::info!(username = %seed.username, "Seeded user account");
        }
        Ok(self.config.seed_users.len())
    }

    async fn create_user(&self, seed: &SeedUser) -> AppResult<()> {
        let password = seed.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        self.store
            .save(NewCredential {
                username: seed.username.clone(),
                password_hash,
                roles: seed.roles.iter().copied().collect(),
            })
            .await?;
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::Authentication("Invalid username or password".to_string())
}

/// Hash a password with Argon2 and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Credential, Role},
        repository::MockCredentialStore,
    };
    use axum::http::{header, HeaderValue};
    use mockall::predicate::eq;
    use std::collections::BTreeSet;

    fn config() -> AuthConfig {
        AuthConfig {
            realm: "animes".into(),
            session_secret: "test-secret".into(),
            session_ttl_minutes: 5,
            seed_users: vec![SeedUser {
                username: "admin".into(),
                password: "pw".into(),
                roles: vec![Role::User, Role::Admin],
            }],
        }
    }

    fn credential(username: &str, password: &str, roles: &[Role]) -> Credential {
        Credential {
            id: 1,
            username: username.into(),
            password_hash: hash_password(password).unwrap(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn basic(username: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::basic(username, password));
        headers
    }

    #[tokio::test]
    async fn basic_credentials_resolve_the_principal() {
        let mut store = MockCredentialStore::new();
        let stored = credential("carlos", "secret", &[Role::User]);
        store
            .expect_find_by_username()
            .with(eq("carlos"))
            .returning(move |_| Ok(Some(stored.clone())));

        let service = AuthService::new(Arc::new(store), config());
        let principal = service
            .authenticate_request(&basic("carlos", "secret"))
            .await
            .unwrap();

        assert_eq!(principal.username, "carlos");
        assert!(principal.has_role(Role::User));
        assert!(!principal.has_role(Role::Admin));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_rejected() {
        let mut store = MockCredentialStore::new();
        let stored = credential("carlos", "secret", &[Role::User]);
        store
            .expect_find_by_username()
            .returning(move |name| Ok((name == "carlos").then(|| stored.clone())));

        let service = AuthService::new(Arc::new(store), config());
        for headers in [basic("carlos", "nope"), basic("ghost", "secret")] {
            let err = service.authenticate_request(&headers).await.unwrap_err();
            assert!(matches!(err, AppError::Authentication(_)));
        }
    }

    #[tokio::test]
    async fn unknown_users_are_checked_against_a_dummy_hash() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_username().times(2).returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(store), config());
        assert!(!service.dummy_hash.initialized());
        for _ in 0..2 {
            let err = service.authenticate("ghost", "secret").await.unwrap_err();
            assert!(matches!(err, AppError::Authentication(_)));
        }
        let hash = service.dummy_hash.get().expect("dummy hash computed");
        assert!(PasswordHash::new(hash).is_ok());
    }

    #[tokio::test]
    async fn missing_credentials_are_rejected_without_touching_the_store() {
        let store = MockCredentialStore::new();
        let service = AuthService::new(Arc::new(store), config());
        let err = service
            .authenticate_request(&HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let service = AuthService::new(Arc::new(MockCredentialStore::new()), config());
        let principal = Principal {
            username: "admin".into(),
            roles: [Role::User, Role::Admin].into_iter().collect(),
        };
        let token = service.issue_session(&principal).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token)).unwrap(),
        );
        assert_eq!(service.authenticate_request(&headers).await.unwrap(), principal);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("ANIME_SESSION=garbage"),
        );
        assert!(service.authenticate_request(&headers).await.is_err());
    }

    #[tokio::test]
    async fn seeds_only_an_empty_store() {
        let mut store = MockCredentialStore::new();
        store.expect_count().times(1).returning(|| Ok(0));
        store
            .expect_save()
            .times(1)
            .withf(|c| c.username == "admin" && c.roles.contains(&Role::Admin))
            .returning(|c| {
                Ok(Credential {
                    id: 1,
                    username: c.username,
                    password_hash: c.password_hash,
                    roles: c.roles,
                })
            });
        let service = AuthService::new(Arc::new(store), config());
        assert_eq!(service.ensure_seed_users().await.unwrap(), 1);

        let mut populated = MockCredentialStore::new();
        populated.expect_count().returning(|| Ok(2));
        populated.expect_save().never();
        let service = AuthService::new(Arc::new(populated), config());
        assert_eq!(service.ensure_seed_users().await.unwrap(), 0);
    }
}
