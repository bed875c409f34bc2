//! Mining job: find the next proof off the ledger lock, then forge the block
//! under it.
//!
//! At most one job runs at a time. The proof search reads the tip once,
//! runs on the blocking pool and is re-checked against the tip before the
//! block is appended. If the tip moved (a peer chain was adopted) the search
//! is restarted against the new tip.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use actix_web::web;
use log::{debug, info, warn};

use crate::blockchain::{Block, CancelToken, Ledger, find_proof_until};
use crate::error::MiningError;
use crate::transaction::Transaction;

/// Times a job re-targets a moving tip before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

pub struct Miner {
    node_id: String,
    timeout: Option<Duration>,
    shutdown: CancelToken,
    in_flight: AtomicBool,
    current: Mutex<Option<CancelToken>>,
}

/// Clears the single-writer flag when the job ends, however it ends.
struct JobGuard<'a>(&'a AtomicBool);

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Miner {
    /// `timeout` bounds a whole job; `None` lets the search run until it
    /// succeeds or `shutdown` is cancelled.
    pub fn new(node_id: String, timeout: Option<Duration>, shutdown: CancelToken) -> Self {
        Self {
            node_id,
            timeout,
            shutdown,
            in_flight: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Identifier the mining reward is paid to.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Tell a running search its tip is gone so it restarts on the new one.
    pub fn chain_moved(&self) {
        if let Some(token) = self.current.lock().expect("mutex poisoned").as_ref() {
            debug!("MINER - tip moved, restarting search");
            token.cancel();
        }
    }

    /// Stop any running search for good.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn begin(&self) -> Result<JobGuard<'_>, MiningError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| JobGuard(&self.in_flight))
            .map_err(|_| MiningError::Busy)
    }

    /// Find a proof for the current tip, pay the reward and forge a block.
    pub async fn mine(&self, ledger: &Mutex<Ledger>) -> Result<Block, MiningError> {
        let _job = self.begin()?;
        let deadline = self.timeout.map(|t| Instant::now() + t);

        for attempt in 1..=MAX_ATTEMPTS {
            let (last_proof, tip_hash, difficulty) = {
                let ledger = ledger.lock().expect("mutex poisoned");
                let last = ledger.last_block();
                (last.proof, last.hash(), ledger.difficulty())
            };

            let restart = CancelToken::new();
            *self.current.lock().expect("mutex poisoned") = Some(restart.clone());

            let tokens = [self.shutdown.clone(), restart.clone()];
            let t0 = Instant::now();
            let found =
                web::block(move || find_proof_until(last_proof, difficulty, &tokens, deadline))
                    .await
                    .map_err(|e| MiningError::Worker(e.to_string()));
            *self.current.lock().expect("mutex poisoned") = None;

            match found? {
                Ok(proof) => {
                    let mut ledger = ledger.lock().expect("mutex poisoned");
                    if ledger.last_block().hash() != tip_hash {
                        warn!("MINER - tip moved during attempt {attempt}, proof {proof} is stale");
                        continue;
                    }
                    let reward = Transaction::reward(&self.node_id);
                    ledger.new_transaction(reward.sender, reward.recipient, reward.amount);
                    let block = ledger.new_block(proof, None).clone();
                    info!(
                        "MINER - sealed block #{} (proof={}, txs={}) in {} ms",
                        block.index,
                        block.proof,
                        block.transactions.len(),
                        t0.elapsed().as_millis()
                    );
                    return Ok(block);
                }
                Err(MiningError::Aborted) if restart.is_cancelled() && !self.stopped(deadline) => {
                    debug!("MINER - attempt {attempt} restarted");
                }
                Err(e) => {
                    warn!("MINER - search ended without a proof: {e}");
                    return Err(e);
                }
            }
        }

        Err(MiningError::Stale(MAX_ATTEMPTS))
    }

    fn stopped(&self, deadline: Option<Instant>) -> bool {
        self.shutdown.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
    }
}
