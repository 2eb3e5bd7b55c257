//! EntryPoint v0.7 user operations.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

/// A well-formed signature that fails validation, for gas estimation before
/// the owner has signed.
pub const DUMMY_SIGNATURE: &str = "0xfffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";

/// The unpacked JSON form bundlers accept for v0.7.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    pub signature: Bytes,
}

/// `eth_estimateUserOperationGas` result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

/// `pm_sponsorUserOperation` result: paymaster fields plus the gas limits
/// the paymaster is willing to cover.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsorship {
    pub paymaster: Address,
    #[serde(default)]
    pub paymaster_data: Bytes,
    #[serde(default)]
    pub paymaster_verification_gas_limit: U256,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
}

fn pack_u128_pair(high: U256, low: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut word = [0u8; 32];
    high.to_big_endian(&mut word);
    out[..16].copy_from_slice(&word[16..]);
    low.to_big_endian(&mut word);
    out[16..].copy_from_slice(&word[16..]);
    out
}

fn u128_bytes(value: U256) -> [u8; 16] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    let mut out = [0u8; 16];
    out.copy_from_slice(&word[16..]);
    out
}

impl UserOperation {
    /// `factory ‖ factoryData`, empty for an already deployed sender.
    pub fn init_code(&self) -> Bytes {
        match self.factory {
            Some(factory) => {
                let mut code = factory.as_bytes().to_vec();
                if let Some(data) = &self.factory_data {
                    code.extend_from_slice(data);
                }
                Bytes::from(code)
            }
            None => Bytes::new(),
        }
    }

    /// `verificationGasLimit ‖ callGasLimit`, 16 bytes each.
    pub fn account_gas_limits(&self) -> [u8; 32] {
        pack_u128_pair(self.verification_gas_limit, self.call_gas_limit)
    }

    /// `maxPriorityFeePerGas ‖ maxFeePerGas`, 16 bytes each.
    pub fn gas_fees(&self) -> [u8; 32] {
        pack_u128_pair(self.max_priority_fee_per_gas, self.max_fee_per_gas)
    }

    /// `paymaster ‖ verificationGas(16) ‖ postOpGas(16) ‖ paymasterData`,
    /// empty without a paymaster.
    pub fn paymaster_and_data(&self) -> Bytes {
        let Some(paymaster) = self.paymaster else {
            return Bytes::new();
        };
        let mut out = paymaster.as_bytes().to_vec();
        out.extend_from_slice(&u128_bytes(
            self.paymaster_verification_gas_limit.unwrap_or_default(),
        ));
        out.extend_from_slice(&u128_bytes(self.paymaster_post_op_gas_limit.unwrap_or_default()));
        if let Some(data) = &self.paymaster_data {
            out.extend_from_slice(data);
        }
        Bytes::from(out)
    }

    /// The hash the owner signs, bound to the entry point and chain. The
    /// signature field is not covered.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> H256 {
        let packed = ethers::abi::encode(&[
            Token::Address(self.sender),
            Token::Uint(self.nonce),
            Token::FixedBytes(keccak256(self.init_code()).to_vec()),
            Token::FixedBytes(keccak256(&self.call_data).to_vec()),
            Token::FixedBytes(self.account_gas_limits().to_vec()),
            Token::Uint(self.pre_verification_gas),
            Token::FixedBytes(self.gas_fees().to_vec()),
            Token::FixedBytes(keccak256(self.paymaster_and_data()).to_vec()),
        ]);
        H256(keccak256(ethers::abi::encode(&[
            Token::FixedBytes(keccak256(packed).to_vec()),
            Token::Address(entry_point),
            Token::Uint(U256::from(chain_id)),
        ])))
    }

    pub fn apply_estimate(&mut self, estimate: &GasEstimate) {
        self.pre_verification_gas = estimate.pre_verification_gas;
        self.verification_gas_limit = estimate.verification_gas_limit;
        self.call_gas_limit = estimate.call_gas_limit;
        if self.paymaster.is_some() {
            self.paymaster_verification_gas_limit = estimate.paymaster_verification_gas_limit;
            self.paymaster_post_op_gas_limit = estimate.paymaster_post_op_gas_limit;
        }
    }

    pub fn apply_sponsorship(&mut self, sponsorship: &Sponsorship) {
        self.paymaster = Some(sponsorship.paymaster);
        self.paymaster_data = Some(sponsorship.paymaster_data.clone());
        self.paymaster_verification_gas_limit = Some(sponsorship.paymaster_verification_gas_limit);
        self.paymaster_post_op_gas_limit = Some(sponsorship.paymaster_post_op_gas_limit);
        self.pre_verification_gas = sponsorship.pre_verification_gas;
        self.verification_gas_limit = sponsorship.verification_gas_limit;
        self.call_gas_limit = sponsorship.call_gas_limit;
    }
}
