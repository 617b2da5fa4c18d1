use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use chrono::{FixedOffset, Offset, Utc};
use till::{money::DEFAULT_TAX_RATE_BPS, payment::QrisMerchant};
use tracing::{info, warn};

use crate::error::AppError;

pub struct Config {
    pub port: u16,
    pub cafe_name: String,
    pub tax_rate_bps: u32,
    pub catalog_url: Option<String>,
    pub payment_ttl_secs: i64,
    pub utc_offset: FixedOffset,
    pub merchant: QrisMerchant,
}

/// Longest a QRIS intent may stay open: one day.
pub const MAX_PAYMENT_TTL_SECS: i64 = 24 * 60 * 60;
const JAKARTA_UTC_OFFSET: &str = "+07:00";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            cafe_name: "Kopi Senja".to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            catalog_url: None,
            payment_ttl_secs: 300,
            utc_offset: JAKARTA_UTC_OFFSET.parse().unwrap_or_else(|_| Utc.fix()),
            merchant: QrisMerchant {
                name: "Kopi Senja".to_string(),
                city: "Jakarta".to_string(),
                merchant_id: "ID0000000000001".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let cafe_name: String = try_load("CAFE_NAME", "Kopi Senja")?;

        let config = Self {
            port: try_load("RUST_PORT", "1111")?,
            tax_rate_bps: try_load("TAX_RATE_BPS", &DEFAULT_TAX_RATE_BPS.to_string())?,
            catalog_url: var("CATALOG_URL").ok().filter(|url| !url.trim().is_empty()),
            payment_ttl_secs: try_load("PAYMENT_TTL_SECS", "300")?,
            utc_offset: try_load("CAFE_UTC_OFFSET", JAKARTA_UTC_OFFSET)?,
            merchant: QrisMerchant {
                name: try_load("QRIS_MERCHANT_NAME", &cafe_name)?,
                city: try_load("QRIS_MERCHANT_CITY", "Jakarta")?,
                merchant_id: read_secret("QRIS_MERCHANT_ID")
                    .or_else(|_| try_load("QRIS_MERCHANT_ID", "ID0000000000001"))?,
            },
            cafe_name,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.tax_rate_bps > 10_000 {
            return Err(AppError::Config {
                key: "TAX_RATE_BPS",
                reason: format!("{} is above 100%", self.tax_rate_bps),
            });
        }
        if self.payment_ttl_secs <= 0 {
            return Err(AppError::Config {
                key: "PAYMENT_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if self.payment_ttl_secs > MAX_PAYMENT_TTL_SECS {
            return Err(AppError::Config {
                key: "PAYMENT_TTL_SECS",
                reason: format!("must be at most {MAX_PAYMENT_TTL_SECS}"),
            });
        }

        Ok(())
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            AppError::Config {
                key,
                reason: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &'static str) -> Result<String, AppError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret file: {e}");
            AppError::Config {
                key: secret_name,
                reason: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 1111);
        assert_eq!(config.tax_rate_bps, 1000);
        assert!(config.catalog_url.is_none());
        assert_eq!(config.utc_offset.local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("CAFE_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let bad: Result<u16, _> = try_load("CAFE_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(bad, Err(AppError::Config { .. })));

        let offset: FixedOffset = try_load("CAFE_TEST_UNSET_OFFSET", "+07:00").unwrap();
        assert_eq!(offset.local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(Config::default().validate().is_ok());

        for ttl in [0, MAX_PAYMENT_TTL_SECS + 1, i64::MAX] {
            let config = Config {
                payment_ttl_secs: ttl,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(AppError::Config {
                    key: "PAYMENT_TTL_SECS",
                    ..
                })
            ));
        }

        let config = Config {
            tax_rate_bps: 10_001,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
