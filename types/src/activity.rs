//! Activity records read from the DAO contract.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Read-only projection of one `getActivity(id)` result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub creator: Address,
    pub description: String,
    pub amount: U256,
    pub votes: U256,
    pub active: bool,
    pub completed: bool,
}

impl Activity {
    /// Build from the contract's positional return values.
    pub fn from_tuple(id: u64, raw: (Address, String, U256, U256, bool, bool)) -> Self {
        let (creator, description, amount, votes, active, completed) = raw;
        Self {
            id,
            creator,
            description,
            amount,
            votes,
            active,
            completed,
        }
    }
}
