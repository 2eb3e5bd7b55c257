//! Counterfactual smart accounts.

use std::fmt;
use std::sync::Arc;

use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256};
use ethers::utils::{get_create2_address_from_hash, keccak256};
use tracing::debug;

use crowd_signatory::{DelegationSigner, LocalSigner};
use crowd_types::abi::encode_call;
use crowd_types::{DelegatorEnvironment, Network};

use crate::error::AccountError;
use crate::salt::create_salt;

const INITIALIZE_SIGNATURE: &str = "function initialize(address,string[],uint256[],uint256[])";
const FACTORY_DEPLOY_SIGNATURE: &str = "function deploy(bytes,bytes32)";

/// What the factory needs to deploy the account: the hybrid implementation
/// plus its initializer for a single EOA owner and no passkeys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployParams {
    pub implementation: Address,
    pub owner: Address,
    pub init_data: Bytes,
}

impl DeployParams {
    pub fn hybrid(implementation: Address, owner: Address) -> Result<Self, AccountError> {
        let init_data = encode_call(
            INITIALIZE_SIGNATURE,
            &[
                Token::Address(owner),
                Token::Array(vec![]),
                Token::Array(vec![]),
                Token::Array(vec![]),
            ],
        )?;
        Ok(Self {
            implementation,
            owner,
            init_data,
        })
    }

    /// Proxy creation code with `(implementation, init_data)` constructor args.
    pub fn bytecode(&self, proxy_creation_code: &Bytes) -> Bytes {
        let args = ethers::abi::encode(&[
            Token::Address(self.implementation),
            Token::Bytes(self.init_data.to_vec()),
        ]);
        let mut code = proxy_creation_code.to_vec();
        code.extend_from_slice(&args);
        Bytes::from(code)
    }
}

/// A smart account whose address is known whether or not it has been
/// deployed yet.
#[derive(Clone)]
pub struct SmartAccount {
    pub address: Address,
    pub environment: DelegatorEnvironment,
    pub deploy_params: DeployParams,
    pub deploy_salt: H256,
    signer: Arc<dyn DelegationSigner>,
}

impl SmartAccount {
    /// Derive the account owned by `signer` for the given salt. Pure: nothing
    /// is broadcast.
    pub fn counterfactual(
        environment: DelegatorEnvironment,
        signer: Arc<dyn DelegationSigner>,
        salt: H256,
    ) -> Result<Self, AccountError> {
        if environment.simple_factory.is_zero() {
            return Err(AccountError::IncompleteEnvironment("simple factory"));
        }
        if environment.hybrid_implementation.is_zero() {
            return Err(AccountError::IncompleteEnvironment("hybrid implementation"));
        }
        if environment.proxy_creation_code.is_empty() {
            return Err(AccountError::IncompleteEnvironment("proxy creation code"));
        }

        let deploy_params = DeployParams::hybrid(environment.hybrid_implementation, signer.address())?;
        let code_hash = keccak256(deploy_params.bytecode(&environment.proxy_creation_code));
        let address = get_create2_address_from_hash(environment.simple_factory, salt.as_bytes(), code_hash);
        debug!(%address, owner = %deploy_params.owner, "derived counterfactual account");

        Ok(Self {
            address,
            environment,
            deploy_params,
            deploy_salt: salt,
            signer,
        })
    }

    pub fn owner(&self) -> Address {
        self.deploy_params.owner
    }

    pub fn signer(&self) -> Arc<dyn DelegationSigner> {
        Arc::clone(&self.signer)
    }

    pub fn factory(&self) -> Address {
        self.environment.simple_factory
    }

    /// `SimpleFactory.deploy(bytecode, salt)` calldata.
    pub fn factory_data(&self) -> Result<Bytes, AccountError> {
        let bytecode = self.deploy_params.bytecode(&self.environment.proxy_creation_code);
        Ok(encode_call(
            FACTORY_DEPLOY_SIGNATURE,
            &[
                Token::Bytes(bytecode.to_vec()),
                Token::FixedBytes(self.deploy_salt.as_bytes().to_vec()),
            ],
        )?)
    }

    /// Sign a user operation hash as an EIP-191 message.
    pub async fn sign_user_operation_hash(&self, hash: H256) -> Result<Bytes, AccountError> {
        Ok(self.signer.sign_message(hash.as_bytes()).await?)
    }

    /// Sign a 32-byte digest as-is.
    pub async fn sign_hash(&self, hash: H256) -> Result<Bytes, AccountError> {
        Ok(self.signer.sign_hash(hash).await?)
    }

    /// Block explorer page for the account, when the network has one.
    pub fn explorer_link(&self, network: Network) -> Option<String> {
        network
            .explorer_url()
            .map(|base| format!("{base}/address/{:?}", self.address))
    }
}

impl fmt::Debug for SmartAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartAccount")
            .field("address", &self.address)
            .field("owner", &self.deploy_params.owner)
            .field("deploy_salt", &self.deploy_salt)
            .finish_non_exhaustive()
    }
}

/// A fresh account owned by a throwaway local key.
pub fn create_smart_account(environment: DelegatorEnvironment) -> Result<SmartAccount, AccountError> {
    let signer: Arc<dyn DelegationSigner> = Arc::new(LocalSigner::random());
    SmartAccount::counterfactual(environment, signer, create_salt())
}
