use std::collections::BTreeSet;

use log::{debug, info};
use serde_json::Number;

use super::validation::is_valid_chain;
use super::{Block, GENESIS_PROOF, PreviousHash};
use crate::consensus::peer_authority;
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// In-memory ledger: the chain, the pending-transaction buffer and the set
/// of known peers.
///
/// The chain is never empty. It is append-only through [`Ledger::new_block`]
/// and can only be replaced wholesale by [`Ledger::adopt_if_longer`].
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: BTreeSet<String>,
    difficulty: u32,
}

impl Ledger {
    /// Initialize a new ledger with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis(GENESIS_PROOF)],
            pending: Vec::new(),
            peers: BTreeSet::new(),
            difficulty,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Queue a transaction; returns the index of the block that will hold it.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: Number,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        self.last_block().index + 1
    }

    /// Forge a block from every pending transaction and append it.
    ///
    /// `previous_hash` defaults to the hash of the current last block.
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<PreviousHash>) -> &Block {
        let previous_hash = match previous_hash {
            Some(link) => link,
            None => PreviousHash::Digest(self.last_block().hash()),
        };
        let index = self.chain.len() as u64 + 1;
        let transactions = std::mem::take(&mut self.pending);

        debug!(
            "forging block #{} with {} txs (proof={})",
            index,
            transactions.len(),
            proof
        );
        self.chain.push(Block::new(index, transactions, proof, previous_hash));
        self.last_block()
    }

    /// Register a peer from a URL-like address. Returns `false` when the
    /// peer was already known.
    pub fn register_peer(&mut self, address: &str) -> Result<bool, LedgerError> {
        let authority = peer_authority(address)?;
        Ok(self.peers.insert(authority))
    }

    /// Replace the chain with `candidate` when it is strictly longer than
    /// the local chain and valid. The check is repeated here so the swap is
    /// decided against the chain as it is at swap time.
    pub fn adopt_if_longer(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.chain.len() || !is_valid_chain(&candidate, self.difficulty) {
            return false;
        }
        info!(
            "replacing local chain ({} blocks) with peer chain ({} blocks)",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        true
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Known peers, in address order.
    pub fn peers(&self) -> &BTreeSet<String> {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }
}

#[cfg(test)]
impl Ledger {
    /// Search for the next proof on the calling thread and forge a block.
    pub fn mine_blocking(&mut self) -> Result<&Block, crate::error::MiningError> {
        let proof = super::pow::find_proof(self.last_block().proof, self.difficulty)?;
        Ok(self.new_block(proof, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ledger_holds_only_genesis() {
        let ledger = Ledger::new(2);
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 100);
        assert_eq!(genesis.previous_hash, PreviousHash::Genesis);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn transaction_lands_in_next_block() {
        let mut ledger = Ledger::new(2);
        let genesis_hash = ledger.last_block().hash();

        let slot = ledger.new_transaction("a", "b", Number::from(5));
        assert_eq!(slot, 2);
        assert_eq!(ledger.pending().len(), 1);

        let block = ledger.mine_blocking().unwrap().clone();
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, vec![Transaction::new("a", "b", Number::from(5))]);
        assert!(block.previous_hash.points_to(&genesis_hash));
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn block_takes_exactly_the_transactions_since_the_last_block() {
        let mut ledger = Ledger::new(1);
        ledger.new_transaction("a", "b", Number::from(1));
        ledger.mine_blocking().unwrap();

        ledger.new_transaction("c", "d", Number::from(2));
        ledger.new_transaction("e", "f", Number::from(-3));
        let block = ledger.mine_blocking().unwrap();
        let senders: Vec<_> = block.transactions.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(senders, ["c", "e"]);
        assert_eq!(block.index, 3);
    }

    #[test]
    fn explicit_previous_hash_is_used() {
        let mut ledger = Ledger::new(2);
        let link = PreviousHash::Digest("cafe".into());
        let block = ledger.new_block(7, Some(link.clone()));
        assert_eq!(block.previous_hash, link);
        assert_eq!(block.proof, 7);
    }

    #[test]
    fn peers_are_deduplicated_and_sorted() {
        let mut ledger = Ledger::new(2);
        assert!(ledger.register_peer("http://10.0.0.2:5000").unwrap());
        assert!(ledger.register_peer("http://10.0.0.1:5000/").unwrap());
        assert!(!ledger.register_peer("http://10.0.0.2:5000/chain").unwrap());
        let peers: Vec<_> = ledger.peers().iter().cloned().collect();
        assert_eq!(peers, ["10.0.0.1:5000", "10.0.0.2:5000"]);
    }

    #[test]
    fn invalid_peer_address_is_rejected() {
        let mut ledger = Ledger::new(2);
        assert!(ledger.register_peer("/just/a/path").is_err());
        assert!(ledger.peers().is_empty());
    }

    #[test]
    fn adopts_only_strictly_longer_valid_chains() {
        let mut ours = Ledger::new(2);
        ours.mine_blocking().unwrap();

        let mut theirs = Ledger::new(2);
        theirs.mine_blocking().unwrap();
        assert!(!ours.adopt_if_longer(theirs.chain().to_vec()));

        theirs.mine_blocking().unwrap();
        let mut forged = theirs.chain().to_vec();
        forged[2].previous_hash = PreviousHash::Genesis;
        assert!(!ours.adopt_if_longer(forged));

        assert!(ours.adopt_if_longer(theirs.chain().to_vec()));
        assert_eq!(ours.chain(), theirs.chain());
    }
}
