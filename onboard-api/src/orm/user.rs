//! Database operations for accounts and credentials.
//!
//! Emails are stored normalized (trimmed, lowercased) so uniqueness is
//! case- and whitespace-insensitive. Password hashes are argon2 PHC strings;
//! reset tokens are stored only as SHA-256 digests.

use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{NewUser, RegisterInput, Role, User};

/// Reset tokens are valid for one hour.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Trims and lowercases an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hashes a password with argon2, producing a PHC-format string.
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("argon2 hashing should not fail")
        .to_string()
}

/// Verifies a password against a stored PHC hash string. Invalid hash
/// formats count as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Gets a single user by ID.
pub fn get_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq(user_id)).first::<User>(conn).optional()
}

/// Gets a single user by email (case- and whitespace-insensitive).
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    user_email: &str,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    let normalized = normalize_email(user_email);
    users
        .filter(email.eq(normalized))
        .first::<User>(conn)
        .optional()
}

/// Registers a new account.
///
/// An unrecognized or omitted role falls back to the default low-privilege
/// role with a warning instead of failing. A duplicate normalized email is a
/// `Conflict`.
pub fn register_user(conn: &mut SqliteConnection, input: RegisterInput) -> Result<User, ApiError> {
    use crate::schema::users::dsl::*;

    if input.name.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::validation("name, email and password are required"));
    }

    let normalized = normalize_email(&input.email);

    let user_role = match input.role.as_deref() {
        None => Role::Employee,
        Some(raw) => Role::parse(raw).unwrap_or_else(|| {
            warn!(
                "[register] unrecognized role {:?}, defaulting to {}",
                raw,
                Role::Employee.as_str()
            );
            Role::Employee
        }),
    };

    if get_user_by_email(conn, &normalized)?.is_some() {
        return Err(ApiError::Conflict("email is already registered".to_string()));
    }

    let now = Utc::now().naive_utc();
    let new_user = NewUser {
        name: input.name.trim().to_string(),
        email: normalized,
        password_hash: hash_password(&input.password),
        role: user_role.as_str().to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(users).values(&new_user).execute(conn)?;

    users.order(id.desc()).first::<User>(conn).map_err(Into::into)
}

/// Checks email/password credentials.
///
/// Unknown email and wrong password produce the same `Unauthorized`;
/// a deactivated account is `Forbidden`.
pub fn verify_credentials(
    conn: &mut SqliteConnection,
    user_email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = get_user_by_email(conn, user_email)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.active {
        return Err(ApiError::forbidden(
            "Account is deactivated. Contact an administrator",
        ));
    }

    Ok(user)
}

/// Users holding a manager-capable role, ordered by name. These are the
/// valid approvers for new requests.
pub fn list_approvers(conn: &mut SqliteConnection) -> Result<Vec<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(role.eq_any(vec![Role::Admin.as_str(), Role::Hr.as_str()]))
        .filter(active.eq(true))
        .order(name.asc())
        .load::<User>(conn)
}

/// Starts a password reset. Returns `None` when the email is not registered
/// (callers surface that explicitly); otherwise stores the token digest plus
/// a one-hour expiry and returns the plaintext token for out-of-band
/// delivery.
pub fn create_reset_token(
    conn: &mut SqliteConnection,
    user_email: &str,
) -> Result<Option<(User, String)>, ApiError> {
    use crate::schema::users::dsl::*;

    let user = match get_user_by_email(conn, user_email)? {
        Some(u) => u,
        None => return Ok(None),
    };

    let token = Uuid::new_v4().simple().to_string();
    let expires = Utc::now().naive_utc() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    diesel::update(users.filter(id.eq(user.id)))
        .set((
            reset_token_digest.eq(Some(digest_token(&token))),
            reset_token_expires.eq(Some(expires)),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    Ok(Some((user, token)))
}

/// Finds the account holding a live (unexpired) reset token.
pub fn find_user_by_reset_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    let now = Utc::now().naive_utc();
    users
        .filter(reset_token_digest.eq(Some(digest_token(token))))
        .filter(reset_token_expires.gt(Some(now)))
        .first::<User>(conn)
        .optional()
}

/// Consumes a reset token: one UPDATE replaces the credential hash and
/// clears both reset fields. A wrong or expired token yields one generic
/// error; callers cannot tell which.
pub fn consume_reset_token(
    conn: &mut SqliteConnection,
    token: &str,
    new_password: &str,
) -> Result<User, ApiError> {
    use crate::schema::users::dsl::*;

    if new_password.len() < 6 {
        return Err(ApiError::validation(
            "password must be at least 6 characters",
        ));
    }

    let user = find_user_by_reset_token(conn, token)?
        .ok_or_else(|| ApiError::validation("Invalid or expired token"))?;

    diesel::update(users.filter(id.eq(user.id)))
        .set((
            password_hash.eq(hash_password(new_password)),
            reset_token_digest.eq(None::<String>),
            reset_token_expires.eq(None::<chrono::NaiveDateTime>),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    get_user(conn, user.id)?
        .ok_or_else(|| ApiError::Internal("user vanished during reset".to_string()))
}
