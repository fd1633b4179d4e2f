//! Access policy
//!
//! One ordered rule table maps a method and path to the access it needs.
//! The first matching rule wins; paths no rule mentions need an
//! authenticated caller with any role.

use axum::{
    extract::{Request, State},
    http::{header::WWW_AUTHENTICATE, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, AppResult},
    models::{Principal, Role},
    AppState,
};

/// What a request must present to pass the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

struct Rule {
    /// `None` matches every method
    method: Option<Method>,
    /// Exact path, or a `/**` suffix matching the prefix and everything below it
    pattern: &'static str,
    access: Access,
}

impl Rule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if self.method.as_ref().is_some_and(|m| m != method) {
            return false;
        }
        match self.pattern.strip_suffix("/**") {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

static RULES: [Rule; 9] = [
    Rule { method: Some(Method::POST), pattern: "/animes/**", access: Access::Role(Role::Admin) },
    Rule { method: Some(Method::PUT), pattern: "/animes/**", access: Access::Role(Role::Admin) },
    Rule { method: Some(Method::DELETE), pattern: "/animes/**", access: Access::Role(Role::Admin) },
    Rule { method: Some(Method::GET), pattern: "/animes/**", access: Access::Role(Role::User) },
    Rule { method: None, pattern: "/swagger-ui/**", access: Access::Public },
    Rule { method: None, pattern: "/api-docs/**", access: Access::Public },
    Rule { method: None, pattern: "/login", access: Access::Public },
    Rule { method: None, pattern: "/logout", access: Access::Public },
    Rule { method: None, pattern: "/health", access: Access::Public },
];

/// Access required for `method` on `path`
pub fn required_access(method: &Method, path: &str) -> Access {
    RULES
        .iter()
        .find(|rule| rule.matches(method, path))
        .map(|rule| rule.access)
        .unwrap_or(Access::Authenticated)
}

/// Check an authenticated principal against the required access
pub fn authorize(access: Access, principal: &Principal) -> AppResult<()> {
    match access {
        Access::Role(role) if !principal.has_role(role) => Err(AppError::Authorization(format!(
            "Access denied: role {} required",
            role
        ))),
        _ => Ok(()),
    }
}

/// Middleware gating every request on the rule table
pub async fn enforce_access_policy(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = required_access(request.method(), request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    let auth = &state.services.auth;
    let principal = match auth.authenticate_request(request.headers()).await {
        Ok(principal) => principal,
        Err(err) => return challenge(err, auth.realm()),
    };

    if let Err(err) = authorize(access, &principal) {
        return err.into_response();
    }

    tracing::debug!(
        user = %principal.username,
        method = %request.method(),
        path = %request.uri().path(),
        "Request authorized"
    );
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Error response, plus a Basic challenge when credentials were missing or wrong
fn challenge(err: AppError, realm: &str) -> Response {
    let needs_challenge = matches!(err, AppError::Authentication(_));
    let mut response = err.into_response();
    if needs_challenge {
        if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            username: "someone".into(),
            roles: roles.iter().copied().collect(),
        }
    }

    #[test]
    fn mutations_on_animes_require_admin() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            assert_eq!(required_access(&method, "/animes"), Access::Role(Role::Admin));
            assert_eq!(required_access(&method, "/animes/1"), Access::Role(Role::Admin));
        }
        assert_eq!(
            required_access(&Method::POST, "/animes/batch"),
            Access::Role(Role::Admin)
        );
    }

    #[test]
    fn reads_on_animes_require_user() {
        assert_eq!(required_access(&Method::GET, "/animes"), Access::Role(Role::User));
        assert_eq!(required_access(&Method::GET, "/animes/7"), Access::Role(Role::User));
    }

    #[test]
    fn prefix_rules_do_not_match_sibling_paths() {
        assert_eq!(required_access(&Method::GET, "/animesx"), Access::Authenticated);
        assert_eq!(required_access(&Method::POST, "/animes-archive"), Access::Authenticated);
    }

    #[test]
    fn documentation_and_login_are_public() {
        assert_eq!(required_access(&Method::GET, "/swagger-ui/index.html"), Access::Public);
        assert_eq!(required_access(&Method::GET, "/api-docs/openapi.json"), Access::Public);
        assert_eq!(required_access(&Method::POST, "/login"), Access::Public);
        assert_eq!(required_access(&Method::GET, "/health"), Access::Public);
    }

    #[test]
    fn everything_else_needs_authentication() {
        assert_eq!(required_access(&Method::GET, "/"), Access::Authenticated);
        assert_eq!(required_access(&Method::PATCH, "/animes/1"), Access::Authenticated);
    }

    #[test]
    fn role_checks_are_set_membership() {
        let user = principal(&[Role::User]);
        let admin = principal(&[Role::User, Role::Admin]);
        let admin_only = principal(&[Role::Admin]);

        assert!(authorize(Access::Role(Role::User), &user).is_ok());
        assert!(matches!(
            authorize(Access::Role(Role::Admin), &user),
            Err(AppError::Authorization(_))
        ));
        assert!(authorize(Access::Role(Role::Admin), &admin).is_ok());
        assert!(authorize(Access::Role(Role::User), &admin).is_ok());
        assert!(authorize(Access::Role(Role::User), &admin_only).is_err());
        assert!(authorize(Access::Authenticated, &admin_only).is_ok());
    }
}
