use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::blockchain::{Block, CancelToken, Ledger, PreviousHash};
use crate::config::NodeConfig;
use crate::miner::Miner;
use crate::transaction::Transaction;

/// Shared application state: the ledger behind its single lock, the
/// mining job runner and peer query settings.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub miner: Miner,
    pub peer_timeout: Duration,
}

impl AppState {
    pub fn new(config: &NodeConfig, node_id: String, shutdown: CancelToken) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(config.difficulty)),
            miner: Miner::new(node_id, config.mine_timeout, shutdown),
            peer_timeout: config.peer_timeout,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: PreviousHash,
}

/* ---------- TX API Models ---------- */

/// Every field is optional so a missing one is reported as "Missing values"
/// instead of a deserializer error.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<Number>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PendingResponse<'a> {
    pub transactions: &'a [Transaction],
    pub length: usize,
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    #[serde(default)]
    pub nodes: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub message: &'static str,
    pub replaced: bool,
    /// Present under `new_chain` when replaced, `chain` otherwise.
    #[serde(flatten)]
    pub chain: ResolvedChain,
}

#[derive(Serialize)]
pub enum ResolvedChain {
    #[serde(rename = "new_chain")]
    Replaced(Vec<Block>),
    #[serde(rename = "chain")]
    Kept(Vec<Block>),
}
