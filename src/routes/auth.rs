use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::AppState;
use crate::api::ApiError;
use crate::auth::{login_user, logout_user};
use crate::error::AppError;
use crate::models::{Credentials, SessionUser};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    /// First run: no account exists yet, offer registration instead.
    registering: bool,
    error: Option<String>,
    static_hash: &'static str,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/register", post(register_submit))
        .route("/logout", post(logout))
}

async fn login_page(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    // If the existence check fails, fall back to the login form; signing
    // in will report its own errors.
    let user_exists = state.api.user_exists().await.unwrap_or_else(|e| {
        tracing::error!("Failed to check user existence: {e}");
        true
    });

    let template = LoginTemplate {
        registering: !user_exists,
        error: None,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = Credentials {
        email: form.email.clone(),
        password: form.password,
    };

    match state.api.sign_in(&credentials).await {
        Ok(token) => {
            login_user(
                &session,
                SessionUser {
                    email: form.email,
                    token,
                },
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(ApiError::Unauthorized | ApiError::Validation(_) | ApiError::NotFound(_)) => {
            let template = LoginTemplate {
                registering: false,
                error: Some("Invalid email or password".to_string()),
                static_hash: crate::STATIC_HASH,
            };
            Ok(Html(template.render()?).into_response())
        }
        Err(e) => {
            tracing::error!("Sign-in failed: {e}");
            let template = LoginTemplate {
                registering: false,
                error: Some("Could not reach the API, try again.".to_string()),
                static_hash: crate::STATIC_HASH,
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = Credentials {
        email: form.email.clone(),
        password: form.password,
    };

    if let Err(e) = state.api.register(&credentials).await {
        tracing::error!("Registration failed: {e}");
        let template = LoginTemplate {
            registering: true,
            error: Some("Registration failed".to_string()),
            static_hash: crate::STATIC_HASH,
        };
        return Ok(Html(template.render()?).into_response());
    }

    match state.api.sign_in(&credentials).await {
        Ok(token) => {
            login_user(
                &session,
                SessionUser {
                    email: form.email,
                    token,
                },
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::error!("Sign-in after registration failed: {e}");
            Ok(Redirect::to("/login").into_response())
        }
    }
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    Ok(Redirect::to("/login"))
}
