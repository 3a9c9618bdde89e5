use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::utils::date_window::AttendanceClock;

pub const DEFAULT_EXPORT_FILE: &str = "firestore-with-subcollections.json";

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// `None` runs against in-memory backends.
    pub database_url: Option<String>,
    pub api_prefix: String,
    pub cors_origin: String,

    /// Used when create-user omits a password.
    pub default_password: String,

    // Generated attendance
    pub timezone_offset_minutes: i32,
    pub clock_in_hour_utc: u32,
    pub clock_out_hour_utc: u32,

    // Rate limiting
    pub rate_user_admin_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,
    pub export_file: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .trim()
        .parse()
        .with_context(|| format!("{name} is not valid"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            api_prefix: var_or("API_PREFIX", ""),
            cors_origin: var_or("CORS_ORIGIN", "https://alvynstane.github.io"),
            default_password: var_or("DEFAULT_PASSWORD", "User123"),

            timezone_offset_minutes: parse_var("TIMEZONE_OFFSET_MINUTES", "420")?, // +07:00
            clock_in_hour_utc: parse_var("CLOCK_IN_HOUR_UTC", "2")?,
            clock_out_hour_utc: parse_var("CLOCK_OUT_HOUR_UTC", "10")?,

            rate_user_admin_per_min: parse_var("RATE_USER_ADMIN_PER_MIN", "60")?,

            log_dir: var_or("LOG_DIR", "logs"),
            log_level: var_or("LOG_LEVEL", "DEBUG")
                .parse()
                .context("LOG_LEVEL is not valid")?,
            export_file: var_or("EXPORT_FILE", DEFAULT_EXPORT_FILE),
        };

        config.attendance_clock()?;
        Ok(config)
    }

    pub fn attendance_clock(&self) -> Result<AttendanceClock> {
        let hour = |name: &str, h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0).with_context(|| format!("{name} must be 0..=23"))
        };
        if self.timezone_offset_minutes.abs() >= 24 * 60 {
            bail!("TIMEZONE_OFFSET_MINUTES must be within one day");
        }

        Ok(AttendanceClock {
            offset_minutes: self.timezone_offset_minutes,
            clock_in: hour("CLOCK_IN_HOUR_UTC", self.clock_in_hour_utc)?,
            clock_out: hour("CLOCK_OUT_HOUR_UTC", self.clock_out_hour_utc)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            api_prefix: String::new(),
            cors_origin: "https://alvynstane.github.io".to_string(),
            default_password: "User123".to_string(),
            timezone_offset_minutes: 420,
            clock_in_hour_utc: 2,
            clock_out_hour_utc: 10,
            rate_user_admin_per_min: 60,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            export_file: DEFAULT_EXPORT_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_matches_business_hours() {
        let clock = Config::default().attendance_clock().unwrap();
        assert_eq!(clock.offset_minutes, 420);
        assert_eq!(clock.clock_in, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
        assert_eq!(clock.clock_out, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn out_of_range_hours_are_rejected() {
        let config = Config {
            clock_out_hour_utc: 24,
            ..Config::default()
        };
        assert!(config.attendance_clock().is_err());

        let config = Config {
            timezone_offset_minutes: 24 * 60,
            ..Config::default()
        };
        assert!(config.attendance_clock().is_err());
    }
}
