//! Session state and operations.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

use crowd_account::{create_salt, create_smart_account, AccountError, DeploymentTracker, SmartAccount};
use crowd_bundler::{
    AccountDeployer, BundlerError, ChainReader, ErrorKind, EthersChain, UserOperationSender,
    UserOperationSubmitter,
};
use crowd_config::AppConfig;
use crowd_delegation::{
    create_root_delegation, encode_redeem, Caveat, Delegation, DelegationDomain, DelegationLifecycle,
    DelegationState,
};
use crowd_signatory::{Signatory, SignatoryName, SignatoryRegistry};
use crowd_types::{
    Address, Call, DelegatorEnvironment, DeploymentStatus, Notice, Notifier, UserOperationReceipt,
};
use crowd_verification::{CloudVerifier, IdentityGate, ProofPayload, ProofVerifier, VerifiedIdentity};

use crate::error::SessionError;
use crate::notify::TracingNotifier;

/// How a signed delegation is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedeemPath {
    /// The delegate calls `DelegationManager.redeemDelegations`, which runs
    /// the execution as the delegator after the caveats pass.
    #[default]
    DelegationChain,
    /// The delegator sends the execution itself; the delegation is only a
    /// precondition.
    DirectCall,
}

impl FromStr for RedeemPath {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delegation" | "delegation-chain" | "chain" => Ok(Self::DelegationChain),
            "direct" | "direct-call" => Ok(Self::DirectCall),
            other => Err(SessionError::InvalidRedeemPath(other.to_string())),
        }
    }
}

/// External collaborators a session talks to.
pub struct SessionServices {
    pub registry: SignatoryRegistry,
    pub sender: Arc<dyn UserOperationSender>,
    pub chain: Arc<dyn ChainReader>,
    pub verifier: Option<Arc<dyn ProofVerifier>>,
    pub notifier: Arc<dyn Notifier>,
}

struct SessionState {
    selected: SignatoryName,
    /// Bumped whenever the selection changes; results of requests started
    /// under an older epoch are dropped.
    epoch: u64,
    delegate: Option<SmartAccount>,
    delegator: Option<SmartAccount>,
    delegator_status: Arc<DeploymentTracker>,
    delegation: DelegationLifecycle,
    last_receipt: Option<UserOperationReceipt>,
    redeem_in_flight: bool,
}

impl SessionState {
    fn clear_delegator(&mut self) {
        self.delegator = None;
        self.delegator_status = Arc::new(DeploymentTracker::default());
        self.delegation.reset();
        self.last_receipt = None;
    }
}

/// Read-only view of the session for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub selected: SignatoryName,
    pub delegate: Option<Address>,
    pub delegator: Option<Address>,
    pub delegator_status: DeploymentStatus,
    pub delegation_state: DelegationState,
    pub last_transaction: Option<crowd_types::H256>,
    pub verified: bool,
}

pub struct DaoSession {
    environment: DelegatorEnvironment,
    chain_id: u64,
    redeem_path: RedeemPath,
    registry: SignatoryRegistry,
    sender: Arc<dyn UserOperationSender>,
    chain: Arc<dyn ChainReader>,
    deployer: AccountDeployer,
    gate: Option<IdentityGate>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl DaoSession {
    pub fn new(config: &AppConfig, services: SessionServices) -> Result<Self, SessionError> {
        let redeem_path = config.submission.redeem_path.parse()?;
        let gate = services
            .verifier
            .map(|v| IdentityGate::new(v, config.identity.action.clone()));
        Ok(Self {
            environment: config.environment.clone(),
            chain_id: config.chain_id,
            redeem_path,
            registry: services.registry,
            deployer: AccountDeployer::new(Arc::clone(&services.sender)),
            sender: services.sender,
            chain: services.chain,
            gate,
            notifier: services.notifier,
            state: Mutex::new(SessionState {
                selected: SignatoryName::default(),
                epoch: 0,
                delegate: None,
                delegator: None,
                delegator_status: Arc::new(DeploymentTracker::default()),
                delegation: DelegationLifecycle::default(),
                last_receipt: None,
                redeem_in_flight: false,
            }),
        })
    }

    /// Wire the HTTP bundler, the `ethers` provider, the cloud verifier (when
    /// an app id is configured) and log-backed notices.
    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        let verifier = match CloudVerifier::from_config(&config.identity) {
            Ok(v) => Some(Arc::new(v) as Arc<dyn ProofVerifier>),
            Err(e) => {
                debug!(error = %e, "identity verification disabled");
                None
            }
        };
        let services = SessionServices {
            registry: SignatoryRegistry::new(config),
            sender: Arc::new(UserOperationSubmitter::from_config(config)?),
            chain: Arc::new(EthersChain::connect(&config.rpc_url)?),
            verifier,
            notifier: Arc::new(TracingNotifier),
        };
        Self::new(config, services)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raise the one notice for `err` and hand it back.
    fn fail<T>(&self, err: SessionError) -> Result<T, SessionError> {
        if err.kind() == ErrorKind::Unknown {
            error!(error = %err, "session operation failed");
        } else {
            info!(error = %err, kind = %err.kind(), "session operation failed");
        }
        self.notifier.notify(err.notice());
        Err(err)
    }

    fn settle<T>(&self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        result.or_else(|e| self.fail(e))
    }

    fn delegation_domain(&self) -> DelegationDomain {
        DelegationDomain::new(self.chain_id, self.environment.delegation_manager)
    }

    pub fn environment(&self) -> &DelegatorEnvironment {
        &self.environment
    }

    pub fn redeem_path(&self) -> RedeemPath {
        self.redeem_path
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            selected: state.selected,
            delegate: state.delegate.as_ref().map(|a| a.address),
            delegator: state.delegator.as_ref().map(|a| a.address),
            delegator_status: state.delegator_status.status(),
            delegation_state: state.delegation.state(),
            last_transaction: state.last_receipt.as_ref().map(|r| r.transaction_hash()),
            verified: self.gate.as_ref().map(IdentityGate::is_verified).unwrap_or(false),
        }
    }

    pub fn delegate(&self) -> Option<SmartAccount> {
        self.state().delegate.clone()
    }

    pub fn delegator(&self) -> Option<SmartAccount> {
        self.state().delegator.clone()
    }

    pub fn delegation(&self) -> Option<Delegation> {
        self.state().delegation.delegation().cloned()
    }

    pub fn last_receipt(&self) -> Option<UserOperationReceipt> {
        self.state().last_receipt.clone()
    }

    /// Create the throwaway delegate account. Idempotent.
    pub fn initialize(&self) -> Result<Address, SessionError> {
        let mut state = self.state();
        if let Some(delegate) = &state.delegate {
            return Ok(delegate.address);
        }
        match create_smart_account(self.environment.clone()) {
            Ok(account) => {
                info!(delegate = %account.address, "delegate account ready");
                let address = account.address;
                state.delegate = Some(account);
                Ok(address)
            }
            Err(e) => {
                drop(state);
                self.fail(e.into())
            }
        }
    }

    /// Switch signatory. Whatever the delegator side held is discarded,
    /// including results of requests still in flight. A disabled signatory
    /// can be selected; it only fails once it is asked to log in.
    pub fn select_signatory(&self, name: SignatoryName) {
        let disabled = self.registry.get(name).map(|s| s.is_disabled()).unwrap_or(true);
        {
            let mut state = self.state();
            state.selected = name;
            state.epoch += 1;
            state.clear_delegator();
        }
        info!(signatory = name.as_str(), disabled, "signatory selected");
        if disabled {
            self.notifier.notify(Notice::info(
                "Signatory unavailable",
                format!("{name} is not configured"),
            ));
        }
    }

    fn selected_signatory(&self) -> Result<(Arc<dyn Signatory>, u64), SessionError> {
        let (name, epoch) = {
            let state = self.state();
            (state.selected, state.epoch)
        };
        let signatory = self
            .registry
            .get(name)
            .filter(|s| !s.is_disabled())
            .ok_or_else(|| SessionError::SignatoryUnavailable(name.as_str().to_string()))?;
        Ok((signatory, epoch))
    }

    pub fn can_logout(&self) -> bool {
        self.selected_signatory()
            .map(|(s, _)| s.can_logout())
            .unwrap_or(false)
    }

    /// End the signatory session and drop the delegator side. A no-op when
    /// the signatory cannot log out.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let result = async {
            let (signatory, _) = self.selected_signatory()?;
            if !signatory.can_logout() {
                debug!("logout not supported by the selected signatory");
                return Ok(());
            }
            signatory.logout().await?;
            if let Some(gate) = &self.gate {
                gate.reset();
            }
            let mut state = self.state();
            state.epoch += 1;
            state.clear_delegator();
            info!("logged out");
            Ok::<_, SessionError>(())
        }
        .await;
        self.settle(result)
    }

    /// Log in with the selected signatory and derive a fresh counterfactual
    /// delegator account. Replaces any previous delegator and delegation.
    pub async fn create_delegator(&self) -> Result<Address, SessionError> {
        let result = async {
            let (signatory, epoch) = self.selected_signatory()?;
            let login = signatory.login().await?;
            let account = SmartAccount::counterfactual(self.environment.clone(), login.signer, create_salt())?;
            let status = if self.chain.is_deployed(account.address).await? {
                DeploymentStatus::Deployed
            } else {
                DeploymentStatus::Counterfactual
            };

            let mut state = self.state();
            if state.epoch != epoch {
                return Err(SessionError::Superseded);
            }
            let address = account.address;
            state.delegator = Some(account);
            state.delegator_status = Arc::new(DeploymentTracker::new(status));
            state.delegation.reset();
            info!(delegator = %address, owner = %login.owner, %status, "delegator account ready");
            Ok::<_, SessionError>(address)
        }
        .await;
        self.settle(result)
    }

    /// Deploy the delegator. Returns `Ok(None)` without doing anything unless
    /// a delegator exists and is exactly counterfactual.
    pub async fn deploy_delegator(&self) -> Result<Option<UserOperationReceipt>, SessionError> {
        let (account, tracker, epoch) = {
            let state = self.state();
            match &state.delegator {
                Some(account) if state.delegator_status.status() == DeploymentStatus::Counterfactual => (
                    account.clone(),
                    Arc::clone(&state.delegator_status),
                    state.epoch,
                ),
                _ => {
                    debug!("deploy skipped: no counterfactual delegator");
                    return Ok(None);
                }
            }
        };

        match self.deployer.deploy(&account, &tracker).await {
            Ok(receipt) => {
                let mut state = self.state();
                if state.epoch == epoch {
                    state.last_receipt = Some(receipt.clone());
                }
                drop(state);
                self.notifier
                    .notify(Notice::success("Account deployed", format!("{:?}", account.address)));
                Ok(Some(receipt))
            }
            Err(BundlerError::Account(AccountError::NotCounterfactual(status))) => {
                debug!(%status, "deploy skipped: another deploy claimed the account");
                Ok(None)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// A new unsigned root delegation from the delegator to the delegate.
    pub fn create_delegation(&self, caveats: Vec<Caveat>) -> Result<Delegation, SessionError> {
        let mut state = self.state();
        let accounts = match (&state.delegate, &state.delegator) {
            (None, _) => Err(SessionError::NoDelegate),
            (_, None) => Err(SessionError::NoDelegator),
            (Some(delegate), Some(delegator)) => Ok((delegate.address, delegator.address)),
        };
        let (delegate, delegator) = match accounts {
            Ok(accounts) => accounts,
            Err(e) => {
                drop(state);
                return self.fail(e);
            }
        };
        let delegation = create_root_delegation(delegate, delegator, caveats);
        state.delegation.created(delegation.clone());
        info!(%delegate, %delegator, caveats = delegation.caveats.len(), "delegation created");
        Ok(delegation)
    }

    /// Sign the held delegation with the delegator's owner. Re-signing
    /// replaces the signature.
    pub async fn sign_delegation(&self) -> Result<Delegation, SessionError> {
        let result = async {
            let (delegator, mut lifecycle, epoch) = {
                let state = self.state();
                let delegator = state.delegator.clone().ok_or(SessionError::NoDelegator)?;
                (delegator, state.delegation.clone(), state.epoch)
            };
            let salt = lifecycle.delegation().map(|d| d.salt);
            let signer = delegator.signer();
            let signed = lifecycle.sign(signer.as_ref(), &self.delegation_domain()).await?.clone();

            let mut state = self.state();
            // a delegation created while signing wins over the signed copy
            if state.epoch != epoch || state.delegation.delegation().map(|d| d.salt) != salt {
                return Err(SessionError::Superseded);
            }
            state.delegation = lifecycle;
            info!(delegator = %signed.delegator, "delegation signed");
            Ok::<_, SessionError>(signed)
        }
        .await;
        self.settle(result)
    }

    /// Whether redeem's preconditions hold right now.
    pub fn can_redeem(&self) -> bool {
        let state = self.state();
        redeem_blocker(&state).is_none()
    }

    /// Redeem the signed delegation to run `execution` as the delegator.
    /// Returns `Ok(None)` without doing anything while blocked: delegator not
    /// deployed, no delegate, missing or placeholder signature, or another
    /// redeem in flight.
    pub async fn redeem_delegation(&self, execution: Call) -> Result<Option<UserOperationReceipt>, SessionError> {
        if let Err(e) = self.require_verified() {
            return self.fail(e);
        }
        let (delegate, delegator, delegation, epoch) = {
            let mut state = self.state();
            if let Some(reason) = redeem_blocker(&state) {
                debug!(reason, "redeem blocked");
                return Ok(None);
            }
            let (Some(delegate), Some(delegator), Ok(delegation)) =
                (&state.delegate, &state.delegator, state.delegation.signed())
            else {
                return Ok(None);
            };
            let claimed = (delegate.clone(), delegator.clone(), delegation.clone(), state.epoch);
            state.redeem_in_flight = true;
            claimed
        };

        let result = match self.redeem_path {
            RedeemPath::DelegationChain => match encode_redeem(&[delegation], &execution) {
                Ok(data) => {
                    let call = Call::new(self.environment.delegation_manager).with_data(data);
                    self.sender.submit(&delegate, &[call], None).await.map_err(SessionError::from)
                }
                Err(e) => Err(e.into()),
            },
            RedeemPath::DirectCall => self
                .sender
                .submit(&delegator, &[execution], None)
                .await
                .map_err(SessionError::from),
        };

        let mut state = self.state();
        state.redeem_in_flight = false;
        match result {
            Ok(receipt) => {
                if state.epoch == epoch {
                    state.delegation.mark_redeemed();
                    state.last_receipt = Some(receipt.clone());
                }
                drop(state);
                info!(tx = ?receipt.transaction_hash(), path = ?self.redeem_path, "delegation redeemed");
                self.notifier.notify(Notice::success(
                    "Delegation redeemed",
                    format!("{:?}", receipt.transaction_hash()),
                ));
                Ok(Some(receipt))
            }
            Err(e) => {
                drop(state);
                self.fail(e)
            }
        }
    }

    /// Send `call` from the delegator account.
    pub async fn call_contract(&self, call: Call) -> Result<UserOperationReceipt, SessionError> {
        let result = async {
            self.require_verified()?;
            let (delegator, epoch) = {
                let state = self.state();
                (state.delegator.clone().ok_or(SessionError::NoDelegator)?, state.epoch)
            };
            let receipt = self.sender.submit(&delegator, &[call], None).await?;
            let mut state = self.state();
            if state.epoch == epoch {
                state.last_receipt = Some(receipt.clone());
            }
            Ok::<_, SessionError>(receipt)
        }
        .await;
        let receipt = self.settle(result)?;
        self.notifier.notify(Notice::success(
            "Transaction confirmed",
            format!("{:?}", receipt.transaction_hash()),
        ));
        Ok(receipt)
    }

    /// Check a proof-of-personhood proof with the verification service.
    pub async fn verify_identity(&self, payload: &ProofPayload) -> Result<VerifiedIdentity, SessionError> {
        let result = async {
            let gate = self.gate.as_ref().ok_or(SessionError::VerificationNotConfigured)?;
            Ok::<_, SessionError>(gate.verify(payload, None).await?)
        }
        .await;
        let identity = self.settle(result)?;
        self.notifier
            .notify(Notice::success("Verified", "Your identity has been verified."));
        Ok(identity)
    }

    pub fn is_verified(&self) -> bool {
        self.gate.as_ref().map(IdentityGate::is_verified).unwrap_or(false)
    }

    /// Writes need a verified identity whenever a verifier is configured.
    pub fn require_verified(&self) -> Result<(), SessionError> {
        match &self.gate {
            Some(gate) => gate.require_verified().map(|_| ()).map_err(SessionError::from),
            None => Ok(()),
        }
    }
}

fn redeem_blocker(state: &SessionState) -> Option<&'static str> {
    if state.redeem_in_flight {
        return Some("redeem already in flight");
    }
    if state.delegate.is_none() {
        return Some("no delegate account");
    }
    if state.delegator.is_none() || !state.delegator_status.status().is_deployed() {
        return Some("delegator not deployed");
    }
    match state.delegation.delegation() {
        None => Some("no delegation"),
        Some(d) if d.signature.is_empty() => Some("delegation not signed"),
        Some(d) if d.signature.iter().all(|b| *b == 0) => Some("placeholder signature"),
        Some(_) if state.delegation.state() != DelegationState::Signed => Some("delegation already redeemed"),
        Some(_) => None,
    }
}
