//! Test helpers: an in-memory database for unit tests and a fully wired
//! Rocket instance for integration tests.

use std::sync::Arc;

use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket};

use super::db::{run_pending_migrations, set_foreign_keys};
use crate::config::AppConfig;
use crate::mailer::{Mailer, RecordingMailer};

/// Creates a synchronous in-memory SQLite database connection for unit tests.
///
/// Runs all embedded migrations and enables foreign key support. Each call
/// returns a new, independent in-memory database.
pub fn setup_test_db() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    conn
}

/// Creates and configures a Rocket instance for testing.
///
/// The returned Rocket instance has:
/// - A unique shared in-memory SQLite database
/// - Foreign keys enabled and all migrations run
/// - The default admin account and request-type catalog seeded
/// - A [`RecordingMailer`] managed both as the active mailer and directly,
///   so tests can assert on outgoing mail
/// - All API routes mounted
pub fn test_rocket() -> Rocket<Build> {
    use uuid::Uuid;

    // Unique shared in-memory DB per test instance.
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };
    let databases = map!["sqlite_db" => db_config];

    let figment = rocket::Config::figment().merge(("databases", databases));

    let mailer = Arc::new(RecordingMailer::default());

    let rocket = rocket::custom(figment)
        .attach(super::db::DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(crate::admin_init_fairing::admin_init_fairing())
        .manage(AppConfig::for_testing())
        .manage(mailer.clone() as Arc<dyn Mailer>)
        .manage(mailer);

    crate::mount_api_routes(rocket)
}
