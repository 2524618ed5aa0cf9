//! Health check endpoint for monitoring.

use rocket::{Route, serde::json::Json};
use serde::Serialize;
use ts_rs::TS;

#[derive(Serialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/status`
/// - **Method:** `GET`
/// - **Authentication:** None required
#[rocket::get("/status")]
pub fn health_status() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> Vec<Route> {
    routes![health_status]
}
