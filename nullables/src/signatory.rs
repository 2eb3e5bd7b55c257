//! Nullable signatory: a fixed local key, with scripted login failures.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crowd_signatory::{DelegationSigner, LocalSigner, LoginOutcome, Signatory, SignatoryError, SignatoryName};

/// Pauses the next digest signature: `started` fires when signing begins,
/// and signing finishes once `release` is notified.
#[derive(Clone, Default)]
pub struct SigningHold {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// The signer handed out on login. Shares the pending hold with its
/// signatory.
struct NullSigner {
    inner: LocalSigner,
    hold: Arc<Mutex<Option<SigningHold>>>,
}

#[async_trait]
impl DelegationSigner for NullSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_hash(&self, hash: H256) -> Result<Bytes, SignatoryError> {
        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.started.notify_one();
            hold.release.notified().await;
        }
        self.inner.sign_hash(hash).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignatoryError> {
        self.inner.sign_message(message).await
    }
}

pub struct NullSignatory {
    name: SignatoryName,
    signer: LocalSigner,
    hold: Arc<Mutex<Option<SigningHold>>>,
    reject: AtomicBool,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl NullSignatory {
    /// A signatory registered under `name` that always logs in as the same
    /// random owner.
    pub fn new(name: SignatoryName) -> Self {
        Self {
            name,
            signer: LocalSigner::random(),
            hold: Arc::new(Mutex::new(None)),
            reject: AtomicBool::new(false),
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        }
    }

    /// Make later logins fail as if the user declined.
    pub fn reject_logins(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Pause the next delegation signature made by any signer this
    /// signatory handed out.
    pub fn hold_signing(&self) -> SigningHold {
        let hold = SigningHold::default();
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signatory for NullSignatory {
    fn name(&self) -> SignatoryName {
        self.name
    }

    async fn login(&self) -> Result<LoginOutcome, SignatoryError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(SignatoryError::UserRejected("login declined".into()));
        }
        Ok(LoginOutcome {
            owner: self.signer.address(),
            signer: Arc::new(NullSigner {
                inner: self.signer.clone(),
                hold: Arc::clone(&self.hold),
            }),
        })
    }

    async fn logout(&self) -> Result<(), SignatoryError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn can_logout(&self) -> bool {
        true
    }
}
