//! Proof-of-Work puzzle: find `p'` such that `sha256("{p}{p'}")` starts with
//! `difficulty` hex zeros, where `p` is the previous block's proof.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::hash::sha256_hex;
use crate::error::MiningError;

/// How many candidates are tried between cancellation checks.
const CHECK_EVERY: u64 = 1024;

/// Shared flag a running proof search polls to know it should stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// True when `proof` solves the puzzle posed by `last_proof`.
pub fn valid_proof(last_proof: u64, proof: u64, difficulty: u32) -> bool {
    solves(last_proof, proof, &target_prefix(difficulty))
}

fn target_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

fn solves(last_proof: u64, proof: u64, prefix: &str) -> bool {
    sha256_hex(format!("{last_proof}{proof}").as_bytes()).starts_with(prefix)
}

/// Smallest non-negative proof valid after `last_proof`. Blocks until found.
pub fn find_proof(last_proof: u64, difficulty: u32) -> Result<u64, MiningError> {
    search(last_proof, difficulty, || false)
}

/// Like [`find_proof`] but gives up with [`MiningError::Aborted`] once any of
/// `tokens` is cancelled or `deadline` passes.
pub fn find_proof_until(
    last_proof: u64,
    difficulty: u32,
    tokens: &[CancelToken],
    deadline: Option<Instant>,
) -> Result<u64, MiningError> {
    search(last_proof, difficulty, || {
        tokens.iter().any(CancelToken::is_cancelled)
            || deadline.is_some_and(|d| Instant::now() >= d)
    })
}

fn search(
    last_proof: u64,
    difficulty: u32,
    mut should_stop: impl FnMut() -> bool,
) -> Result<u64, MiningError> {
    let prefix = target_prefix(difficulty);
    let mut proof: u64 = 0;
    loop {
        if proof % CHECK_EVERY == 0 && should_stop() {
            return Err(MiningError::Aborted);
        }
        if solves(last_proof, proof, &prefix) {
            return Ok(proof);
        }
        proof = proof.checked_add(1).ok_or(MiningError::Exhausted)?;
    }
}
