// ============================
// authgate-lib/src/handlers/auth.rs
// ============================
//! Signup, signin and signout.
use std::sync::Arc;

use authgate_common::{AuthResponse, MessageResponse, SESSION_COOKIE};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use metrics::counter;
use tracing::{error, info, warn};

use crate::auth::{AuthError, Credentials, NewUser, TokenPayload};
use crate::error::AppError;
use crate::metrics::{SIGNIN, SIGNIN_FAILED, SIGNOUT, SIGNUP};
use crate::storage::User;
use crate::validation::ValidatedJson;
use crate::AppState;

type AuthReply = (StatusCode, CookieJar, Json<AuthResponse>);

fn payload(user: &User) -> TokenPayload {
    TokenPayload {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

/// `POST /signup`
pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(new_user): ValidatedJson<NewUser>,
) -> Result<AuthReply, AppError> {
    let email = new_user.email.clone();

    let user = state.auth.create_user(new_user).await.map_err(|e| {
        match &e {
            AuthError::EmailConflict => warn!(email = %email, "Signup error: email already exists"),
            other => error!(email = %email, error = %other, "Signup error"),
        }
        AppError::from(e)
    })?;

    let token = state.tokens.sign(&payload(&user))?;
    let jar = state.cookies.set(jar, SESSION_COOKIE, token);

    info!(email = %email, user_id = user.id, "User registered successfully");
    counter!(SIGNUP).increment(1);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered".to_string(),
            user: user.view(),
        }),
    ))
}

/// `POST /signin`
pub async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<AuthReply, AppError> {
    let email = credentials.email.clone();

    let user = state.auth.authenticate_user(credentials).await.map_err(|e| {
        match &e {
            // the reason is logged; the client sees one message for both
            AuthError::NotFound | AuthError::InvalidCredentials => {
                warn!(email = %email, reason = %e, "Signin error");
                counter!(SIGNIN_FAILED).increment(1);
            }
            other => error!(email = %email, error = %other, "Signin error"),
        }
        AppError::from(e)
    })?;

    let token = state.tokens.sign(&payload(&user))?;
    let jar = state.cookies.set(jar, SESSION_COOKIE, token);

    info!(email = %email, user_id = user.id, "User signed in successfully");
    counter!(SIGNIN).increment(1);

    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse {
            message: "User signed in successfully".to_string(),
            user: user.view(),
        }),
    ))
}

/// `POST /signout`
pub async fn signout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<MessageResponse>) {
    let jar = state.cookies.clear(jar, SESSION_COOKIE);

    info!("User signed out successfully");
    counter!(SIGNOUT).increment(1);

    (
        StatusCode::OK,
        jar,
        Json(MessageResponse {
            message: "User signed out successfully".to_string(),
        }),
    )
}
