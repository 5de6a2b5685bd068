use chrono::FixedOffset;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://earnton.ru/go/api";

/// Europe/Moscow has been UTC+3 all year round since 2014.
pub const MOSCOW_UTC_OFFSET_SECS: i32 = 3 * 3600;

pub const TRANSFER_VALIDITY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("EARNTON_RECIPIENT_ADDRESS was not set at build time")]
    MissingRecipient,
    #[error("invalid timezone offset {0}s")]
    BadOffset(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    /// Wallet that receives every deposit.
    pub recipient_address: String,
    pub timezone: FixedOffset,
    pub transfer_validity_secs: i64,
}

impl Config {
    /// Reads values baked in at compile time.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            option_env!("EARNTON_RECIPIENT_ADDRESS"),
            option_env!("EARNTON_API_URL"),
        )
    }

    pub fn from_values(
        recipient_address: Option<&str>,
        api_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let recipient_address = recipient_address
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .ok_or(ConfigError::MissingRecipient)?
            .to_string();

        let api_url = api_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        let timezone = FixedOffset::east_opt(MOSCOW_UTC_OFFSET_SECS)
            .ok_or(ConfigError::BadOffset(MOSCOW_UTC_OFFSET_SECS))?;

        Ok(Self {
            api_url,
            recipient_address,
            timezone,
            transfer_validity_secs: TRANSFER_VALIDITY_SECS,
        })
    }

    pub fn transaction_url(&self) -> String {
        format!("{}/transaction", self.api_url)
    }

    pub fn statistics_url(&self) -> String {
        format!("{}/statistics", self.api_url)
    }
}
