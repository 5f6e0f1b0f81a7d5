//! Login and logout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use doacoes_core::Role;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Login form fields.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Where a user lands after logging in.
const fn home(role: Role) -> &'static str {
    match role {
        Role::Admin => "/users",
        Role::Gerente => "/dashboard",
    }
}

/// `GET /`: send the caller to their home page or to the login page.
pub async fn root(OptionalUser(user): OptionalUser) -> Redirect {
    Redirect::to(user.map_or("/login", |u| home(u.role)))
}

/// Render the login page, skipping it for logged-in users.
pub async fn login_page(OptionalUser(user): OptionalUser) -> Response {
    match user {
        Some(user) => Redirect::to(home(user.role)).into_response(),
        None => LoginTemplate {
            email: String::new(),
            error: None,
        }
        .into_response(),
    }
}

/// Check the credentials and start a session.
///
/// # Errors
///
/// Returns an error if the database or the session store fails.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("login rejected");
            let template = LoginTemplate {
                email: form.email,
                error: Some("Invalid email or password.".to_string()),
            };
            return Ok((StatusCode::UNAUTHORIZED, template).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;

    Ok(Redirect::to(home(user.role)).into_response())
}

/// End the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;

    Ok(Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_by_role() {
        assert_eq!(home(Role::Admin), "/users");
        assert_eq!(home(Role::Gerente), "/dashboard");
    }
}
