//! Sending contract creation transactions.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Eip1559TransactionRequest};
use std::sync::Arc;
use tracing::info;

use crowd_types::FeeQuote;

use crate::error::DeployError;

/// Deploys one contract and reports its address.
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// The account paying for and owning deployments.
    fn deployer_address(&self) -> Address;

    /// Deploy `bytecode` with ABI-encoded constructor `args` appended.
    async fn deploy(&self, name: &str, bytecode: Bytes, args: Vec<Token>) -> Result<Address, DeployError>;
}

/// Creation bytecode followed by the encoded constructor arguments.
pub fn creation_code(bytecode: &Bytes, args: &[Token]) -> Bytes {
    let mut code = bytecode.to_vec();
    if !args.is_empty() {
        code.extend(ethers::abi::encode(args));
    }
    Bytes::from(code)
}

/// [`ContractDeployer`] backed by a local key and an HTTP provider.
pub struct EthersDeployer {
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
    fees: Option<FeeQuote>,
}

impl EthersDeployer {
    pub fn new(provider: Provider<Http>, wallet: LocalWallet, chain_id: u64) -> Self {
        let wallet = wallet.with_chain_id(chain_id);
        Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            fees: None,
        }
    }

    /// Connect to `rpc_url` with a hex private key.
    pub fn connect(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self, DeployError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| DeployError::Provider(format!("invalid RPC URL {rpc_url}: {e}")))?;
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| DeployError::Provider(format!("invalid deployer key: {e}")))?;
        Ok(Self::new(provider, wallet, chain_id))
    }

    /// Use fixed EIP-1559 fees instead of the provider's estimate.
    pub fn with_fees(mut self, fees: Option<FeeQuote>) -> Self {
        self.fees = fees;
        self
    }
}

#[async_trait]
impl ContractDeployer for EthersDeployer {
    fn deployer_address(&self) -> Address {
        self.client.address()
    }

    async fn deploy(&self, name: &str, bytecode: Bytes, args: Vec<Token>) -> Result<Address, DeployError> {
        let failed = |reason: String| DeployError::Transaction {
            name: name.to_string(),
            reason,
        };

        let mut tx = Eip1559TransactionRequest::new()
            .from(self.client.address())
            .data(creation_code(&bytecode, &args));
        if let Some(fees) = self.fees {
            tx = tx
                .max_fee_per_gas(fees.max_fee_per_gas)
                .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let tx_hash = *pending;
        let receipt = pending
            .await
            .map_err(|e| failed(e.to_string()))?
            .ok_or_else(|| failed(format!("transaction {tx_hash:?} dropped")))?;

        if receipt.status.map(|s| s.is_zero()).unwrap_or(false) {
            return Err(failed(format!("transaction {tx_hash:?} reverted")));
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| failed(format!("receipt for {tx_hash:?} has no contract address")))?;
        info!(name, %address, tx = ?tx_hash, "contract deployed");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_args_are_appended() {
        let code = Bytes::from(vec![0x60, 0x80]);
        assert_eq!(creation_code(&code, &[]), code);
        let with_arg = creation_code(&code, &[Token::Address(Address::repeat_byte(1))]);
        assert_eq!(with_arg.len(), 2 + 32);
        assert_eq!(with_arg[33], 1);
    }

    #[test]
    fn connect_rejects_bad_key() {
        assert!(matches!(
            EthersDeployer::connect("http://127.0.0.1:8545", "0x12", 31337),
            Err(DeployError::Provider(_))
        ));
    }
}
