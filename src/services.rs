use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::types::*;

#[async_trait(?Send)]
pub trait DepositBackend {
    /// Posts the record once and returns the HTTP status.
    async fn record_deposit(&self, record: &DepositRecord) -> Result<u16>;

    async fn get_statistics(&self) -> Result<StatisticsSnapshot>;
}

pub struct DepositService {
    client: Client,
    transaction_url: String,
    statistics_url: String,
}

impl DepositService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            transaction_url: config.transaction_url(),
            statistics_url: config.statistics_url(),
        }
    }
}

#[async_trait(?Send)]
impl DepositBackend for DepositService {
    async fn record_deposit(&self, record: &DepositRecord) -> Result<u16> {
        log::info!("Posting deposit {} to {}", record.header.hash, self.transaction_url);

        let response = self
            .client
            .post(&self.transaction_url)
            .json(record)
            .send()
            .await
            .context("deposit request failed")?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Deposit endpoint answered {}", status);
        }
        Ok(status.as_u16())
    }

    async fn get_statistics(&self) -> Result<StatisticsSnapshot> {
        let response = self
            .client
            .get(&self.statistics_url)
            .send()
            .await
            .context("statistics request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("statistics endpoint answered {}", response.status());
        }

        let snapshot = response
            .json::<StatisticsSnapshot>()
            .await
            .context("statistics response is not valid JSON")?;
        log::info!("Loaded {} statistics entries", snapshot.len());

        Ok(snapshot)
    }
}
