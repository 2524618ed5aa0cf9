//! Registration, login, password reset, and profile endpoints.

use rocket::Route;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::guards::AuthenticatedUser;
use crate::auth::token::issue_token;
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResponse};
use crate::models::{PublicUser, RegisterInput};
use crate::orm::DbConn;
use crate::orm::user::{
    consume_reset_token, create_reset_token, find_user_by_reset_token, register_user,
    verify_credentials,
};
use rocket::State;

/// Token plus the public account projection, returned on register and login.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct VerifiedTokenResponse {
    pub email: String,
}

/// Register endpoint.
///
/// - **URL:** `/api/auth/register`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// Creates an account and returns a fresh bearer token alongside the public
/// projection. An unrecognized role falls back to the default rather than
/// failing; a duplicate email is a 409.
#[post("/auth/register", data = "<input>")]
pub async fn register(
    db: DbConn,
    config: &State<AppConfig>,
    input: Json<RegisterInput>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let user = db.run(move |conn| register_user(conn, input.into_inner())).await?;
    let token = issue_token(user.id, config)?;
    Ok(ApiResponse::with_message(
        "User registered",
        AuthResponse {
            token,
            user: user.public(),
        },
    ))
}

/// Login endpoint.
///
/// - **URL:** `/api/auth/login`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// Unknown email and wrong password get the same 401; a deactivated
/// account gets 403.
#[post("/auth/login", data = "<input>")]
pub async fn login(
    db: DbConn,
    config: &State<AppConfig>,
    input: Json<LoginInput>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let user = db
        .run(move |conn| verify_credentials(conn, &input.email, &input.password))
        .await?;
    let token = issue_token(user.id, config)?;
    Ok(ApiResponse::data(AuthResponse {
        token,
        user: user.public(),
    }))
}

/// Forgot Password endpoint.
///
/// - **URL:** `/api/auth/forgot-password`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// An unregistered email is told so explicitly with a 404. On success the
/// plaintext token is returned in the response and logged; out-of-band
/// delivery is not wired up.
#[post("/auth/forgot-password", data = "<input>")]
pub async fn forgot_password(
    db: DbConn,
    input: Json<ForgotPasswordInput>,
) -> Result<Json<ApiResponse<ResetTokenResponse>>, ApiError> {
    let outcome = db
        .run(move |conn| create_reset_token(conn, &input.email))
        .await?;

    match outcome {
        None => Err(ApiError::not_found("Email is not registered")),
        Some((user, token)) => {
            info!("[auth] password reset token for '{}': {}", user.email, token);
            Ok(ApiResponse::with_message(
                "Reset token generated",
                ResetTokenResponse { reset_token: token },
            ))
        }
    }
}

/// Reset Password endpoint.
///
/// - **URL:** `/api/auth/reset-password`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// Wrong and expired tokens produce the same generic 400.
#[post("/auth/reset-password", data = "<input>")]
pub async fn reset_password(
    db: DbConn,
    input: Json<ResetPasswordInput>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    db.run(move |conn| consume_reset_token(conn, &input.token, &input.password))
        .await?;
    Ok(ApiResponse::message("Password updated"))
}

/// Verify Reset Token endpoint.
///
/// - **URL:** `/api/auth/verify-reset-token/<token>`
/// - **Method:** `GET`
/// - **Authentication:** None required
#[get("/auth/verify-reset-token/<token>")]
pub async fn verify_reset_token(
    db: DbConn,
    token: String,
) -> Result<Json<ApiResponse<VerifiedTokenResponse>>, ApiError> {
    let user = db
        .run(move |conn| find_user_by_reset_token(conn, &token))
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired token"))?;
    Ok(ApiResponse::data(VerifiedTokenResponse { email: user.email }))
}

/// Profile endpoint.
///
/// - **URL:** `/api/auth/profile`
/// - **Method:** `GET`
/// - **Authentication:** Bearer token
#[get("/auth/profile")]
pub async fn profile(auth: AuthenticatedUser) -> Json<ApiResponse<PublicUser>> {
    ApiResponse::data(auth.user.public())
}

pub fn routes() -> Vec<Route> {
    routes![
        register,
        login,
        forgot_password,
        reset_password,
        verify_reset_token,
        profile
    ]
}
