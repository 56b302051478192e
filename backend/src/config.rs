use anyhow::anyhow;
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub redis_pool_size: u32,
    pub jwt_secret: String,
    /// Business time zone applied uniformly to every wall-clock decision
    /// (office hours, calendar dates, batch cutoffs).
    pub time_zone: Tz,
    /// Office hours are [open, close) in local hours-of-day.
    pub office_open_hour: u32,
    pub office_close_hour: u32,
    /// Local wall-clock time at which the auto-checkout job closes open
    /// check-ins, and the instant written into force-closed records.
    pub auto_checkout_at: NaiveTime,
    /// Local wall-clock time at which the absentee-marking job runs.
    pub absentee_run_at: NaiveTime,
    pub listen_port: u16,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/geoattend".to_string());

        let redis_url = env::var("REDIS_URL").ok();
        let redis_pool_size = env_parse("REDIS_POOL_SIZE", 8)?;

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let office_open_hour = env_parse("OFFICE_OPEN_HOUR", 9)?;
        let office_close_hour = env_parse("OFFICE_CLOSE_HOUR", 20)?;
        if office_open_hour >= office_close_hour || office_close_hour > 24 {
            return Err(anyhow!(
                "Invalid office hours: [{}, {})",
                office_open_hour,
                office_close_hour
            ));
        }

        let auto_checkout_at = env_time("AUTO_CHECKOUT_AT", "21:00")?;
        let absentee_run_at = env_time("ABSENTEE_RUN_AT", "23:30")?;
        let listen_port = env_parse("PORT", 3000)?;

        Ok(Config {
            database_url,
            redis_url,
            redis_pool_size,
            jwt_secret,
            time_zone,
            office_open_hour,
            office_close_hour,
            auto_checkout_at,
            absentee_run_at,
            listen_port,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_time(key: &str, default: &str) -> anyhow::Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|_| anyhow!("Invalid {} value (expected HH:MM): {}", key, raw))
}
