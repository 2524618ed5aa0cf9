//! Bearer-token authentication and authorization guards for Rocket routes.
//!
//! [`AuthenticatedUser`] validates the `Authorization: Bearer` header and
//! binds the acting user to the request. Role-specific guards layer a role
//! predicate on top and fail with 403.
//!
//! ```rust
//! use rocket::get;
//! use onboard_api::auth::guards::{AuthenticatedUser, ManagerUser};
//!
//! #[get("/profile")]
//! fn profile(user: AuthenticatedUser) -> String {
//!     format!("Hello, {}", user.user.name)
//! }
//!
//! #[get("/employees")]
//! fn managers_only(user: ManagerUser) -> String {
//!     format!("Manager access for {}", user.user.email)
//! }
//! ```

use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::auth::token::verify_token;
use crate::config::AppConfig;
use crate::models::{Role, User};
use crate::orm::DbConn;
use crate::orm::user::get_user;

/// A request guard for routes that require an authenticated user.
///
/// Performs, in order:
/// 1. Extracts the `Authorization` header and strips the `Bearer ` prefix
/// 2. Verifies the token signature and expiry
/// 3. Loads the user named by the token's `sub` claim
/// 4. Rejects deactivated accounts
///
/// Missing/invalid tokens and vanished users produce 401; a deactivated
/// account produces 403.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };
        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let header = match request.headers().get_one("Authorization") {
            Some(h) => h,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };
        let token = match header.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let claims = match verify_token(&token, config) {
            Ok(claims) => claims,
            Err(_) => return Outcome::Error((Status::Unauthorized, ())),
        };

        let user_result = db.run(move |conn| get_user(conn, claims.sub)).await;

        let user = match user_result {
            Ok(Some(u)) => u,
            Ok(None) => return Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error loading token user: {:?}", e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        if !user.active {
            return Outcome::Error((Status::Forbidden, ()));
        }

        Outcome::Success(AuthenticatedUser { user })
    }
}

impl AuthenticatedUser {
    pub fn role(&self) -> Role {
        self.user.role()
    }

    /// Check if the user has a specific role
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == role
    }

    /// Check if the user has any of the specified roles
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role())
    }

    /// Manager-capable = admin or HR.
    pub fn is_manager(&self) -> bool {
        self.role().is_manager()
    }

    /// Tech-capable = admin or tech lead.
    pub fn is_tech_approver(&self) -> bool {
        self.role().is_tech_approver()
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Macro to create role-specific request guards
macro_rules! create_role_guard {
    ($name:ident, $check:expr) => {
        #[derive(Debug)]
        pub struct $name {
            pub user: User,
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(
                request: &'r Request<'_>,
            ) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                let check: fn(&AuthenticatedUser) -> bool = $check;
                if check(&auth_user) {
                    Outcome::Success($name {
                        user: auth_user.user,
                    })
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }
    };
}

// A request guard that requires the "admin" role.
create_role_guard!(AdminUser, |u| u.is_admin());

// A request guard that requires a manager-capable role (admin or HR).
create_role_guard!(ManagerUser, |u| u.is_manager());
