#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod admin_init_fairing;
pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod orm;
pub mod schema;

pub use orm::DbConn;

use config::AppConfig;
use mailer::{LogMailer, Mailer};

#[catch(401)]
fn unauthorized(req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Unauthorized",
        "path": req.uri().path().to_string(),
        "status": 401
    }))
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Forbidden",
        "path": req.uri().path().to_string(),
        "status": 403
    }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Not Found",
        "path": req.uri().path().to_string(),
        "status": 404
    }))
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Unprocessable Entity",
        "path": req.uri().path().to_string(),
        "status": 422
    }))
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Internal Server Error",
        "path": req.uri().path().to_string(),
        "status": 500
    }))
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<Value> {
    Json(json!({
        "success": false,
        "message": status.reason().unwrap_or("Unknown Error"),
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        "/api",
        [
            api::status::routes(),
            api::auth::routes(),
            api::employee::routes(),
            api::request::routes(),
            api::notification::routes(),
            api::alert::routes(),
        ]
        .concat(),
    )
}

/// Note that this function doesn't get tested by our tests. Tests set up the
/// test_rocket in-memory db defined in orm/testing.rs.
#[launch]
pub fn rocket() -> Rocket<Build> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global())
        .merge(("databases.sqlite_db.url", database_url));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(admin_init_fairing::admin_init_fairing())
        .attach(alerts::alert_scheduler_fairing())
        .manage(AppConfig::from_env())
        .manage(Arc::new(LogMailer) as Arc<dyn Mailer>)
        .register(
            "/",
            catchers![
                unauthorized,
                forbidden,
                not_found,
                unprocessable_entity,
                internal_server_error,
                default_catcher
            ],
        );

    mount_api_routes(rocket)
}
