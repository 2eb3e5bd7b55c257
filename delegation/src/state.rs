//! Delegation lifecycle: none → created → signed → redeemed.

use std::fmt;

use crowd_signatory::DelegationSigner;

use crate::delegation::{Delegation, DelegationDomain};
use crate::error::DelegationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DelegationState {
    #[default]
    None,
    Created,
    Signed,
    Redeemed,
}

impl DelegationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Created => "created",
            Self::Signed => "signed",
            Self::Redeemed => "redeemed",
        }
    }
}

impl fmt::Display for DelegationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single delegation a session works with, plus where it is in its
/// lifecycle.
#[derive(Clone, Debug, Default)]
pub struct DelegationLifecycle {
    delegation: Option<Delegation>,
    redeemed: bool,
}

impl DelegationLifecycle {
    pub fn state(&self) -> DelegationState {
        match &self.delegation {
            None => DelegationState::None,
            Some(_) if self.redeemed => DelegationState::Redeemed,
            Some(d) if d.is_signed() => DelegationState::Signed,
            Some(_) => DelegationState::Created,
        }
    }

    pub fn delegation(&self) -> Option<&Delegation> {
        self.delegation.as_ref()
    }

    /// Replace whatever was there with a freshly created delegation.
    pub fn created(&mut self, delegation: Delegation) {
        self.delegation = Some(delegation);
        self.redeemed = false;
    }

    /// Sign the held delegation. Allowed when created or already signed.
    pub async fn sign(
        &mut self,
        signer: &dyn DelegationSigner,
        domain: &DelegationDomain,
    ) -> Result<&Delegation, DelegationError> {
        let state = self.state();
        match (&mut self.delegation, state) {
            (Some(d), DelegationState::Created | DelegationState::Signed) => {
                d.sign(signer, domain).await?;
                Ok(&*d)
            }
            _ => Err(DelegationError::WrongState {
                expected: DelegationState::Created,
                actual: state,
            }),
        }
    }

    /// The signed delegation, ready to redeem.
    pub fn signed(&self) -> Result<&Delegation, DelegationError> {
        match &self.delegation {
            Some(d) if self.state() == DelegationState::Signed => Ok(d),
            _ => Err(DelegationError::WrongState {
                expected: DelegationState::Signed,
                actual: self.state(),
            }),
        }
    }

    pub fn mark_redeemed(&mut self) {
        if self.delegation.is_some() {
            self.redeemed = true;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::create_root_delegation;
    use crowd_signatory::LocalSigner;
    use ethers::types::Address;

    #[tokio::test]
    async fn walks_the_lifecycle() {
        let domain = DelegationDomain::new(31337, Address::repeat_byte(0xdd));
        let signer = LocalSigner::random();
        let mut life = DelegationLifecycle::default();
        assert_eq!(life.state(), DelegationState::None);
        assert!(life.sign(&signer, &domain).await.is_err());

        life.created(create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]));
        assert_eq!(life.state(), DelegationState::Created);
        assert!(life.signed().is_err());

        life.sign(&signer, &domain).await.unwrap();
        assert_eq!(life.state(), DelegationState::Signed);
        assert!(life.signed().is_ok());

        life.mark_redeemed();
        assert_eq!(life.state(), DelegationState::Redeemed);
        assert!(matches!(
            life.signed(),
            Err(DelegationError::WrongState {
                actual: DelegationState::Redeemed,
                ..
            })
        ));

        life.reset();
        assert_eq!(life.state(), DelegationState::None);
    }

    #[test]
    fn recreating_clears_redeemed() {
        let mut life = DelegationLifecycle::default();
        life.created(create_root_delegation(Address::zero(), Address::zero(), vec![]));
        life.mark_redeemed();
        life.created(create_root_delegation(Address::zero(), Address::zero(), vec![]));
        assert_eq!(life.state(), DelegationState::Created);
    }
}
