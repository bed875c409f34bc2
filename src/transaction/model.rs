use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Sender used for the reward transaction a node pays itself when it mines.
pub const REWARD_SENDER: &str = "0";

/// Amount credited by the mining reward.
pub const REWARD_AMOUNT: u64 = 1;

/// A value transfer between two parties. No identities or balances are
/// checked: any (sender, recipient, amount) triple is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    /// Kept as a JSON number so integer and fractional amounts keep
    /// the exact textual form they were submitted with.
    pub amount: Number,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: Number) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Reward paid to `node_id` for forging a block.
    pub fn reward(node_id: &str) -> Self {
        Self::new(REWARD_SENDER, node_id, Number::from(REWARD_AMOUNT))
    }
}
