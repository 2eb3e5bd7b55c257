//! Read-only chain access.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Bytes, TransactionRequest, U256};

use crowd_types::abi::{decode_output, encode_call};

use crate::error::BundlerError;

const GET_NONCE_SIGNATURE: &str = "function getNonce(address,uint192) view returns (uint256)";

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64, BundlerError>;

    /// Deployed code at `address`; empty for an EOA or a counterfactual account.
    async fn code(&self, address: Address) -> Result<Bytes, BundlerError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, BundlerError>;

    async fn is_deployed(&self, address: Address) -> Result<bool, BundlerError> {
        Ok(!self.code(address).await?.is_empty())
    }

    /// `EntryPoint.getNonce(sender, key)`.
    async fn entry_point_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U256,
    ) -> Result<U256, BundlerError> {
        let data = encode_call(GET_NONCE_SIGNATURE, &[Token::Address(sender), Token::Uint(key)])?;
        let out = self.call(entry_point, data).await?;
        decode_output(GET_NONCE_SIGNATURE, &out)?
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or_else(|| BundlerError::InvalidResponse("getNonce returned no value".into()))
    }
}

/// [`ChainReader`] over an `ethers` HTTP provider.
#[derive(Clone, Debug)]
pub struct EthersChain {
    provider: Provider<Http>,
}

impl EthersChain {
    pub fn new(provider: Provider<Http>) -> Self {
        Self { provider }
    }

    pub fn connect(rpc_url: &str) -> Result<Self, BundlerError> {
        Provider::<Http>::try_from(rpc_url)
            .map(Self::new)
            .map_err(|e| BundlerError::Chain(format!("invalid RPC URL {rpc_url}: {e}")))
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }
}

#[async_trait]
impl ChainReader for EthersChain {
    async fn chain_id(&self) -> Result<u64, BundlerError> {
        self.provider
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| BundlerError::Chain(e.to_string()))
    }

    async fn code(&self, address: Address) -> Result<Bytes, BundlerError> {
        self.provider
            .get_code(address, None)
            .await
            .map_err(|e| BundlerError::Chain(e.to_string()))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, BundlerError> {
        let tx = TransactionRequest::new().to(to).data(data);
        self.provider
            .call(&tx.into(), None)
            .await
            .map_err(|e| BundlerError::Chain(e.to_string()))
    }
}
