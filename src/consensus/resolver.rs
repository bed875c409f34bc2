use std::sync::Mutex;

use futures_util::future::join_all;
use log::{debug, info, warn};

use super::source::{ChainSource, PeerChain};
use crate::blockchain::{Block, Ledger, is_valid_chain};
use crate::error::PeerError;

/// Longest-chain rule: query every known peer and replace the local chain
/// with the longest valid chain strictly longer than it.
///
/// Peers are queried concurrently but judged in address order, so among
/// equally long winners the first address wins. Unreachable peers, error
/// statuses, malformed bodies and invalid chains are skipped. Returns
/// whether the local chain was replaced.
pub async fn resolve_conflicts<S: ChainSource>(ledger: &Mutex<Ledger>, source: &S) -> bool {
    let (peers, local_len, difficulty) = {
        let ledger = ledger.lock().expect("mutex poisoned");
        let peers: Vec<String> = ledger.peers().iter().cloned().collect();
        (peers, ledger.len(), ledger.difficulty())
    };

    if peers.is_empty() {
        debug!("resolve: no peers registered");
        return false;
    }

    let responses = join_all(peers.iter().map(|peer| source.fetch_chain(peer))).await;

    let candidate = pick_longest(&peers, responses, local_len, difficulty);
    let Some(candidate) = candidate else {
        info!("resolve: local chain ({local_len} blocks) is authoritative");
        return false;
    };

    let mut ledger = ledger.lock().expect("mutex poisoned");
    ledger.adopt_if_longer(candidate)
}

fn pick_longest(
    peers: &[String],
    responses: Vec<Result<PeerChain, PeerError>>,
    local_len: usize,
    difficulty: u32,
) -> Option<Vec<Block>> {
    let mut max_length = local_len;
    let mut best = None;

    for (peer, response) in peers.iter().zip(responses) {
        let report = match response {
            Ok(report) => report,
            Err(e) => {
                warn!("resolve: skipping peer: {e}");
                continue;
            }
        };

        if report.length != report.chain.len() {
            warn!(
                "resolve: {peer} reported length {} for a chain of {} blocks; skipping",
                report.length,
                report.chain.len()
            );
            continue;
        }

        if report.length > max_length && is_valid_chain(&report.chain, difficulty) {
            debug!("resolve: {peer} offers a valid chain of {} blocks", report.length);
            max_length = report.length;
            best = Some(report.chain);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::blockchain::PreviousHash;
    use crate::blockchain::pow::find_proof;
    use crate::transaction::Transaction;

    /// In-memory peers keyed by address.
    #[derive(Default)]
    struct FakePeers(HashMap<String, Result<Vec<Block>, u16>>);

    impl FakePeers {
        fn with(mut self, peer: &str, chain: &[Block]) -> Self {
            self.0.insert(peer.to_string(), Ok(chain.to_vec()));
            self
        }

        fn failing(mut self, peer: &str, status: u16) -> Self {
            self.0.insert(peer.to_string(), Err(status));
            self
        }
    }

    #[async_trait(?Send)]
    impl ChainSource for FakePeers {
        async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, PeerError> {
            match self.0.get(peer) {
                Some(Ok(chain)) => Ok(PeerChain {
                    length: chain.len(),
                    chain: chain.clone(),
                }),
                Some(Err(status)) => Err(PeerError::Status {
                    peer: peer.to_string(),
                    status: *status,
                }),
                None => Err(PeerError::Unreachable {
                    peer: peer.to_string(),
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    fn ledger_with_peers(blocks: usize, peers: &[&str]) -> Mutex<Ledger> {
        let mut ledger = Ledger::new(2);
        for _ in 1..blocks {
            ledger.mine_blocking().unwrap();
        }
        for p in peers {
            ledger.register_peer(p).unwrap();
        }
        Mutex::new(ledger)
    }

    /// `base` followed by `extra` honestly mined blocks, each paying `tag`.
    fn extend(base: &[Block], extra: usize, tag: &str) -> Vec<Block> {
        let mut chain = base.to_vec();
        for _ in 0..extra {
            let last = chain.last().unwrap();
            let proof = find_proof(last.proof, 2).unwrap();
            let txs = vec![Transaction::reward(tag)];
            let block = Block::new(last.index + 1, txs, proof, PreviousHash::Digest(last.hash()));
            chain.push(block);
        }
        chain
    }

    #[actix_web::test]
    async fn longer_valid_peer_chain_replaces_ours() {
        let a = ledger_with_peers(2, &["http://node-b:5000"]);
        let a_chain = a.lock().unwrap().chain().to_vec();
        let b_chain = extend(&a_chain, 1, "b");
        assert_eq!(b_chain.len(), 3);
        assert_eq!(&b_chain[..2], &a_chain[..]);

        let peers = FakePeers::default().with("node-b:5000", &b_chain);
        assert!(resolve_conflicts(&a, &peers).await);
        assert_eq!(a.lock().unwrap().chain(), &b_chain[..]);
    }

    #[actix_web::test]
    async fn equal_length_never_replaces() {
        let a = ledger_with_peers(2, &["node-b:5000"]);
        let before = a.lock().unwrap().chain().to_vec();
        let other = extend(&before[..1], 1, "b");

        let peers = FakePeers::default().with("node-b:5000", &other);
        assert!(!resolve_conflicts(&a, &peers).await);
        assert_eq!(a.lock().unwrap().chain(), &before[..]);
    }

    #[actix_web::test]
    async fn invalid_or_unreachable_peers_are_skipped() {
        let a = ledger_with_peers(1, &["bad:1", "down:1", "err:1"]);
        let mut forged = extend(&a.lock().unwrap().chain().to_vec(), 3, "bad");
        forged[2].previous_hash = PreviousHash::Digest("0".repeat(64));

        let peers = FakePeers::default().with("bad:1", &forged).failing("err:1", 500);
        assert!(!resolve_conflicts(&a, &peers).await);
        assert_eq!(a.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn longest_of_several_candidates_wins() {
        let a = ledger_with_peers(1, &["p1:1", "p2:1", "p3:1"]);
        let genesis = a.lock().unwrap().chain().to_vec();
        let short = extend(&genesis, 1, "p1");
        let long = extend(&genesis, 3, "p2");
        let mut broken = extend(&genesis, 5, "p3");
        broken[4].previous_hash = PreviousHash::Genesis;

        let peers = FakePeers::default()
            .with("p1:1", &short)
            .with("p2:1", &long)
            .with("p3:1", &broken);
        assert!(resolve_conflicts(&a, &peers).await);
        assert_eq!(a.lock().unwrap().chain(), &long[..]);
    }

    #[actix_web::test]
    async fn ties_go_to_the_first_address() {
        let a = ledger_with_peers(1, &["zeta:1", "alpha:1"]);
        let genesis = a.lock().unwrap().chain().to_vec();
        let one = extend(&genesis, 2, "alpha");
        let two = extend(&genesis, 2, "zeta");

        let peers = FakePeers::default()
            .with("alpha:1", &one)
            .with("zeta:1", &two);
        assert!(resolve_conflicts(&a, &peers).await);
        assert_eq!(a.lock().unwrap().chain(), &one[..]);
    }

    #[test]
    fn mismatched_length_report_is_skipped() {
        let genesis = Ledger::new(2).chain().to_vec();
        let chain = extend(&genesis, 1, "liar");
        let lying = PeerChain { length: 10, chain };
        assert!(pick_longest(&["liar:1".to_string()], vec![Ok(lying)], 1, 2).is_none());
    }
}
