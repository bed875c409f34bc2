use std::time::Duration;

use async_trait::async_trait;
use awc::Client;
use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::error::PeerError;

/// Largest `/chain` body accepted from a peer.
const MAX_CHAIN_BYTES: usize = 64 * 1024 * 1024;

/// A peer's answer to `GET /chain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerChain {
    pub length: usize,
    pub chain: Vec<Block>,
}

/// Where conflict resolution gets peer chains from.
#[async_trait(?Send)]
pub trait ChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, PeerError>;
}

/// Fetches `http://{peer}/chain` with a per-request timeout.
pub struct HttpChainSource {
    client: Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).finish(),
        }
    }
}

#[async_trait(?Send)]
impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, PeerError> {
        let url = format!("http://{peer}/chain");
        let mut resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PeerError::Unreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(PeerError::Status {
                peer: peer.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.json::<PeerChain>()
            .limit(MAX_CHAIN_BYTES)
            .await
            .map_err(|e| PeerError::Malformed {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}
