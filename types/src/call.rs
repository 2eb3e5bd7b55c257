//! A single call executed by a smart account.

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// One `(target, value, calldata)` triple bundled into a user operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address) -> Self {
        Self {
            to,
            value: U256::zero(),
            data: Bytes::new(),
        }
    }

    /// A call to the zero address with no value and no data.
    ///
    /// Sending it as the first user operation of a counterfactual account
    /// deploys the account without doing anything else.
    pub fn noop() -> Self {
        Self::new(Address::zero())
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn is_noop(&self) -> bool {
        self.to.is_zero() && self.value.is_zero() && self.data.is_empty()
    }
}
