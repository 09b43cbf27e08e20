use std::env;

use crate::queue::DEFAULT_AVG_SERVICE_MINUTES;

/// Process configuration read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Average minutes needed to serve one customer, shared by every salon.
    pub avg_service_minutes: i64,
    /// Broadcast capacity for real-time events. Zero turns them off.
    pub event_buffer: usize,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_user: String,
    pub admin_password: String,
    pub admin_display_name: String,
    pub demo: bool,
    pub vendor_user: String,
    pub vendor_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/salon_queue.db".to_string()),
            port: parse_or("PORT", 8080),
            avg_service_minutes: parse_or("AVG_SERVICE_MINUTES", DEFAULT_AVG_SERVICE_MINUTES)
                .max(0),
            event_buffer: parse_or("EVENT_BUFFER", 256),
            seed: SeedConfig {
                admin_user: env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string()),
                admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
                admin_display_name: env::var("ADMIN_DISPLAY_NAME")
                    .unwrap_or_else(|_| "Super Admin".to_string()),
                demo: env::var("SEED_DEMO").map(|value| value == "true").unwrap_or(false),
                vendor_user: env::var("VENDOR_USER").unwrap_or_else(|_| "vendor1".to_string()),
                vendor_password: env::var("VENDOR_PASSWORD")
                    .unwrap_or_else(|_| "change-me".to_string()),
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{key}={raw} is not valid, falling back to the default");
                default
            }
        },
        Err(_) => default,
    }
}
