//! Nullable chain: code, nonces and call results held in memory.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crowd_bundler::{BundlerError, ChainReader};
use crowd_types::abi::selector;

#[derive(Default)]
struct State {
    code: HashMap<Address, Bytes>,
    nonces: HashMap<Address, U256>,
    responses: HashMap<(Address, Bytes), Result<Bytes, String>>,
    holds: HashMap<(Address, Bytes), Arc<Notify>>,
    calls: Vec<(Address, Bytes)>,
}

/// A chain with no blocks: `eth_call` answers from registered responses and
/// `EntryPoint.getNonce` from per-sender nonces.
pub struct NullChain {
    chain_id: u64,
    state: Mutex<State>,
}

impl NullChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(State::default()),
        }
    }

    /// Give `address` code, so it counts as deployed.
    pub fn deploy(&self, address: Address) {
        self.state
            .lock()
            .unwrap()
            .code
            .insert(address, Bytes::from(vec![0x60, 0x80]));
    }

    pub fn set_nonce(&self, sender: Address, nonce: U256) {
        self.state.lock().unwrap().nonces.insert(sender, nonce);
    }

    /// Answer `eth_call(to, data)` with `output`.
    pub fn respond(&self, to: Address, data: Bytes, output: Bytes) {
        self.state.lock().unwrap().responses.insert((to, data), Ok(output));
    }

    /// Make `eth_call(to, data)` fail with `message`.
    pub fn fail(&self, to: Address, data: Bytes, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((to, data), Err(message.into()));
    }

    /// Keep `eth_call(to, data)` pending until the returned handle is
    /// notified. One `notify_one` releases one call.
    pub fn hold(&self, to: Address, data: Bytes) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .holds
            .insert((to, data), Arc::clone(&release));
        release
    }

    /// Every `eth_call` made, in order.
    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ChainReader for NullChain {
    async fn chain_id(&self) -> Result<u64, BundlerError> {
        Ok(self.chain_id)
    }

    async fn code(&self, address: Address) -> Result<Bytes, BundlerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, BundlerError> {
        let held = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((to, data.clone()));
            state.holds.get(&(to, data.clone())).cloned()
        };
        if let Some(release) = held {
            release.notified().await;
        }

        let state = self.state.lock().unwrap();
        let get_nonce = selector("function getNonce(address,uint192)")?;
        if data.len() >= 36 && data[..4] == get_nonce {
            let sender = Address::from_slice(&data[16..36]);
            let nonce = state.nonces.get(&sender).copied().unwrap_or_default();
            return Ok(Bytes::from(ethers::abi::encode(&[Token::Uint(nonce)])));
        }

        match state.responses.get(&(to, data)) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(BundlerError::Chain(message.clone())),
            None => Err(BundlerError::Chain("execution reverted".into())),
        }
    }
}
