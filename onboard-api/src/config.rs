//! Process configuration, read once at ignition and held in managed state.
//!
//! No module-scope globals: everything that needs configuration receives this
//! struct (or a field of it) explicitly.

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Default recipient for onboarding reminder emails. When unset, the
    /// sweep falls back to the employee's own address.
    pub alert_recipient: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = std::env::var("ONBOARD_JWT_SECRET").unwrap_or_else(|_| {
            warn!("[config] ONBOARD_JWT_SECRET not set, using an insecure development secret");
            "insecure-development-secret".to_string()
        });

        let token_ttl_hours = std::env::var("ONBOARD_JWT_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(168); // one week

        let alert_recipient = std::env::var("ONBOARD_ADMIN_EMAIL").ok();

        AppConfig {
            jwt_secret,
            token_ttl_hours,
            alert_recipient,
        }
    }

    /// Fixed configuration for test rockets.
    pub fn for_testing() -> Self {
        AppConfig {
            jwt_secret: "test-signing-secret".to_string(),
            token_ttl_hours: 1,
            alert_recipient: Some("onboarding-admins@example.com".to_string()),
        }
    }
}
