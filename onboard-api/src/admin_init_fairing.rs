use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;

use crate::models::{NewUser, Role, User};
use crate::orm::DbConn;
use crate::orm::request_type::ensure_request_type;
use crate::orm::user::{hash_password, normalize_email};
use crate::schema::users::dsl::*;

/// Default request-type catalog, seeded once on first boot.
const DEFAULT_REQUEST_TYPES: &[(&str, &str)] = &[
    ("Equipment", "Hardware and equipment purchases"),
    ("Access", "System and building access"),
    ("Software", "Software licenses and installations"),
    ("Training", "Courses and certifications"),
    ("Other", "Anything that does not fit the other categories"),
];

/// Creates the default admin account and seeds the request-type catalog
/// if needed.
///
/// The admin email/password come from the ONBOARD_DEFAULT_EMAIL and
/// ONBOARD_DEFAULT_PASSWORD envars.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin User Initialization", |rocket| async {
        dotenv().ok();

        let conn = match get_db_connection(&rocket).await {
            Some(conn) => conn,
            None => return Err(rocket),
        };

        let bootstrap = conn
            .run(|c| {
                create_admin_user_if_needed(c, &get_admin_email())?;
                seed_request_types(c)
            })
            .await;

        match bootstrap {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: bootstrap failed: {:?}", e);
                Err(rocket)
            }
        }
    })
}

async fn get_db_connection(rocket: &Rocket<rocket::Build>) -> Option<DbConn> {
    match DbConn::get_one(rocket).await {
        Some(conn) => Some(conn),
        None => {
            error!("[admin-init] ERROR: Could not get DB connection.");
            None
        }
    }
}

fn get_admin_email() -> String {
    std::env::var("ONBOARD_DEFAULT_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string())
}

fn get_admin_password() -> String {
    std::env::var("ONBOARD_DEFAULT_PASSWORD").unwrap_or_else(|_| "admin".to_string())
}

fn admin_user_exists(
    c: &mut SqliteConnection,
    admin_email: &str,
) -> Result<bool, diesel::result::Error> {
    let existing_user = users
        .filter(email.eq(admin_email))
        .first::<User>(c)
        .optional()?;

    Ok(existing_user.is_some())
}

fn create_admin_user_if_needed(
    c: &mut SqliteConnection,
    admin_email: &str,
) -> Result<(), diesel::result::Error> {
    let admin_email = normalize_email(admin_email);

    if admin_user_exists(c, &admin_email)? {
        info!("[admin-init] Admin user '{}' already exists", admin_email);
        return Ok(());
    }

    let now = chrono::Utc::now().naive_utc();
    let admin_user = NewUser {
        name: "Administrator".to_string(),
        email: admin_email.clone(),
        password_hash: hash_password(&get_admin_password()),
        role: Role::Admin.as_str().to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    };

    match diesel::insert_into(users).values(&admin_user).execute(c) {
        Ok(_) => {
            info!("[admin-init] Created admin user: '{}'", admin_email);
            Ok(())
        }
        Err(e) => {
            error!("[admin-init] ERROR creating admin user: {:?}", e);
            Err(e)
        }
    }
}

fn seed_request_types(c: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    for (type_name, type_description) in DEFAULT_REQUEST_TYPES {
        ensure_request_type(c, type_name, type_description)?;
    }
    Ok(())
}
