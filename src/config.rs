use std::{env, str::FromStr};

use anyhow::{Context, bail};
use chrono::NaiveTime;

/// Real-world offsets range from UTC-12:00 to UTC+14:00.
const MAX_UTC_OFFSET_MINUTES: u32 = 14 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub scheduling: SchedulingConfig,
    pub payments: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            scheduling: SchedulingConfig::from_env()?,
            payments: PaymentConfig::from_env(),
        })
    }
}

/// Business hours and booking rules of the pickup/delivery calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub slot_minutes: u32,
    pub slot_capacity: u32,
    /// Earliest bookable day, counted from the store-local today.
    pub min_days_ahead: u32,
    /// Latest bookable day, inclusive.
    pub max_days_ahead: u32,
    /// Fixed offset of the store's wall clock from UTC (`DRIVE_UTC_OFFSET_MINUTES`).
    /// No daylight-saving rule is applied: a store in Paris runs on 60 in
    /// winter and needs 120 in summer, otherwise "today" flips one hour late.
    pub utc_offset_minutes: i32,
    pub store_address: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
            slot_capacity: 3,
            min_days_ahead: 1,
            max_days_ahead: 7,
            utc_offset_minutes: 60,
            store_address: "1 place du Marché, 75001 Paris".to_string(),
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            open_time: time_var("DRIVE_OPEN_TIME", defaults.open_time)?,
            close_time: time_var("DRIVE_CLOSE_TIME", defaults.close_time)?,
            slot_minutes: parsed_var("DRIVE_SLOT_MINUTES", defaults.slot_minutes)?,
            slot_capacity: parsed_var("DRIVE_SLOT_CAPACITY", defaults.slot_capacity)?,
            min_days_ahead: parsed_var("DRIVE_MIN_DAYS_AHEAD", defaults.min_days_ahead)?,
            max_days_ahead: parsed_var("DRIVE_MAX_DAYS_AHEAD", defaults.max_days_ahead)?,
            utc_offset_minutes: parsed_var(
                "DRIVE_UTC_OFFSET_MINUTES",
                defaults.utc_offset_minutes,
            )?,
            store_address: env::var("DRIVE_STORE_ADDRESS").unwrap_or(defaults.store_address),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.slot_minutes == 0 {
            bail!("slot length must be at least one minute");
        }
        if self.open_time >= self.close_time {
            bail!("opening time must be before closing time");
        }
        if self.min_days_ahead > self.max_days_ahead {
            bail!("booking window is empty");
        }
        if self.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            bail!(
                "UTC offset must be within ±{} minutes, got {}",
                MAX_UTC_OFFSET_MINUTES,
                self.utc_offset_minutes
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Without a secret key checkout sessions are refused.
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub webhook_tolerance_secs: i64,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("STRIPE_SECRET_KEY").ok().filter(|k| !k.is_empty()),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .ok()
                .filter(|k| !k.is_empty()),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:5173/checkout/success".to_string()),
            cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:5173/checkout/cancel".to_string()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "eur".to_string()),
            webhook_tolerance_secs: 300,
        }
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn time_var(key: &str, default: NaiveTime) -> anyhow::Result<NaiveTime> {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{key} must be formatted as HH:MM")),
        Err(_) => Ok(default),
    }
}
