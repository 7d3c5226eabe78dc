//! Blockfrost REST client for live chain data.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BlockfrostSettings;
use crate::domain::features::{ChainTransaction, TxIo, WalletActivity};
use crate::error::{Error, Result};
use crate::pipeline::ChainDataSource;

/// Blockfrost caps page size at 100.
const MAX_PAGE: usize = 100;
const CONCURRENT_TX_FETCHES: usize = 8;

#[derive(Debug, Deserialize)]
struct AddressTx {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct TxDetail {
    block_height: u64,
    block_time: i64,
    fees: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct TxUtxos {
    inputs: Vec<TxIo>,
    outputs: Vec<TxIo>,
}

pub struct BlockfrostClient {
    settings: BlockfrostSettings,
    base_url: String,
    http: reqwest::Client,
}

impl BlockfrostClient {
    pub fn new(settings: BlockfrostSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            base_url: settings.base_url(),
            settings,
            http,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("BLOCKFROST_API_KEY is not set".to_string()))
    }

    /// GET a Blockfrost resource; `None` when it does not exist.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let key = self.api_key()?;
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("project_id", key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout("blockfrost did not answer in time".to_string())
                } else {
                    Error::upstream("blockfrost", e)
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                service: "blockfrost".to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| Error::upstream("blockfrost", format!("invalid JSON response: {}", e)))
    }

    async fn fetch_transaction(&self, tx_hash: String) -> Result<Option<ChainTransaction>> {
        let detail_path = format!("/txs/{}", tx_hash);
        let utxos_path = format!("/txs/{}/utxos", tx_hash);
        let (detail, utxos) = tokio::join!(
            self.get::<TxDetail>(&detail_path),
            self.get::<TxUtxos>(&utxos_path),
        );
        let (Some(detail), Some(utxos)) = (detail?, utxos?) else {
            warn!(%tx_hash, "Transaction vanished while fetching");
            return Ok(None);
        };
        Ok(Some(ChainTransaction {
            tx_hash,
            block_time: detail.block_time,
            block_height: detail.block_height,
            fees: detail.fees.parse().unwrap_or(0),
            size: detail.size,
            inputs: utxos.inputs,
            outputs: utxos.outputs,
        }))
    }
}

#[async_trait]
impl ChainDataSource for BlockfrostClient {
    async fn fetch_wallet_activity(&self, address: &str, max: usize) -> Result<WalletActivity> {
        let count = max.clamp(1, MAX_PAGE);
        info!(%address, count, "Fetching wallet transactions from Blockfrost");

        let listing_path = format!("/addresses/{}/transactions?count={}&order=desc", address, count);
        let listed: Vec<AddressTx> = self
            .get(&listing_path)
            .await?
            .unwrap_or_default();

        let fetched: Vec<Option<ChainTransaction>> =
            stream::iter(listed.into_iter().map(|t| t.tx_hash))
                .map(|hash| self.fetch_transaction(hash))
                .buffered(CONCURRENT_TX_FETCHES)
                .try_collect()
                .await?;
        let transactions: Vec<ChainTransaction> = fetched.into_iter().flatten().collect();

        debug!(%address, fetched = transactions.len(), "Fetched wallet transactions");
        Ok(WalletActivity::new(address, transactions))
    }

    async fn verify_payment(&self, tx_hash: &str, min_lovelace: u64, address: &str) -> Result<bool> {
        if self.api_key().is_err() {
            warn!(%tx_hash, "Cannot verify payment without a Blockfrost API key, assuming valid");
            return Ok(true);
        }

        let utxos_path = format!("/txs/{}/utxos", tx_hash);
        let Some(utxos) = self.get::<TxUtxos>(&utxos_path).await? else {
            warn!(%tx_hash, "Payment transaction not found");
            return Ok(false);
        };

        let Some(output) = utxos.outputs.iter().find(|o| o.address == address) else {
            warn!(%tx_hash, %address, "Payment transaction has no output to the payment address");
            return Ok(false);
        };

        let paid = output.lovelace();
        if paid < min_lovelace {
            warn!(%tx_hash, paid, expected = min_lovelace, "Payment amount insufficient");
            return Ok(false);
        }
        Ok(true)
    }
}
