//! Interactive login form backed by a signed session cookie

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    services::auth::SESSION_COOKIE,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginPageQuery {
    /// Present after a failed attempt
    pub error: Option<String>,
    /// Present after logging out
    pub logout: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login page
#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    params(LoginPageQuery),
    responses((status = 200, description = "HTML login form", body = String, content_type = "text/html"))
)]
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let notice = if query.error.is_some() {
        r#"<p class="error">Invalid username or password</p>"#
    } else if query.logout.is_some() {
        r#"<p class="notice">You have been signed out</p>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Please sign in</title></head>
<body>
  <form method="post" action="/login">
    <h2>Please sign in</h2>
    {notice}
    <p><label>Username <input type="text" name="username" required autofocus></label></p>
    <p><label>Password <input type="password" name="password" required></label></p>
    <button type="submit">Sign in</button>
  </form>
</body>
</html>"#
    ))
}

/// Submit the login form
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set; or back to /login?error")
    )
)]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> AppResult<Response> {
    let auth = &state.services.auth;
    let principal = match auth.authenticate(&form.username, &form.password).await {
        Ok(principal) => principal,
        Err(AppError::Authentication(_)) => return Ok(Redirect::to("/login?error").into_response()),
        Err(e) => return Err(e),
    };

    let token = auth.issue_session(&principal)?;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        auth.session_ttl_seconds()
    );
    tracing::info!(user = %principal.username, "Signed in via login form");

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/animes")).into_response())
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses((status = 303, description = "Session cookie cleared"))
)]
pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/login?logout"))
}
