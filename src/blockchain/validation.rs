use log::debug;
use thiserror::Error;

use super::Block;
use super::pow::valid_proof;

/// First defect found while walking a candidate chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainFault {
    #[error("block #{index} does not link to the hash of its predecessor")]
    BrokenLink { index: u64 },
    #[error("block #{index} carries an invalid proof")]
    InvalidProof { index: u64 },
}

/// Check hash linkage and proof continuity of `chain`.
///
/// Only `previous_hash` and `proof` are checked. Transaction content,
/// timestamp ordering and `index` numbering are not part of validity.
/// Chains of zero or one block are trivially valid.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> Result<(), ChainFault> {
    for pair in chain.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);

        if !block.previous_hash.points_to(&prev.hash()) {
            return Err(ChainFault::BrokenLink { index: block.index });
        }
        if !valid_proof(prev.proof, block.proof, difficulty) {
            return Err(ChainFault::InvalidProof { index: block.index });
        }
    }
    Ok(())
}

pub fn is_valid_chain(chain: &[Block], difficulty: u32) -> bool {
    match validate_chain(chain, difficulty) {
        Ok(()) => true,
        Err(fault) => {
            debug!("chain of length {} rejected: {}", chain.len(), fault);
            false
        }
    }
}
