pub mod block;
pub mod hash;
pub mod model;
pub mod pow;
pub mod validation;

pub use block::{Block, PreviousHash};
pub use model::Ledger;
pub use pow::{CancelToken, find_proof_until, valid_proof};
pub use validation::is_valid_chain;

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// A SHA-256 hex digest has 64 characters; no proof can do better.
pub const DIFF_MAX: u32 = 64;
