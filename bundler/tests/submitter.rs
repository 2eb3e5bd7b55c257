use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, Bytes, H256, U256};

use crowd_account::{DeploymentTracker, SmartAccount};
use crowd_bundler::{
    classify, AccountDeployer, BundlerError, ErrorKind, UserOperationSender, UserOperationSubmitter,
};
use crowd_nullables::{NullBundler, NullChain, NullSender};
use crowd_signatory::{DelegationSigner, LocalSigner};
use crowd_types::{Call, DelegatorEnvironment, DeploymentStatus, FeeQuote};

const CHAIN_ID: u64 = 11155111;

fn environment() -> DelegatorEnvironment {
    DelegatorEnvironment {
        delegation_manager: Address::repeat_byte(0x01),
        simple_factory: Address::repeat_byte(0x02),
        hybrid_implementation: Address::repeat_byte(0x03),
        proxy_creation_code: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
        ..DelegatorEnvironment::default()
    }
}

fn account() -> SmartAccount {
    let signer: Arc<dyn DelegationSigner> = Arc::new(LocalSigner::random());
    SmartAccount::counterfactual(environment(), signer, H256::repeat_byte(0x5a)).unwrap()
}

fn submitter(bundler: &Arc<NullBundler>, chain: &Arc<NullChain>) -> UserOperationSubmitter {
    UserOperationSubmitter::new(bundler.clone(), chain.clone(), CHAIN_ID)
        .with_poll_interval(Duration::from_millis(1))
}

#[tokio::test]
async fn counterfactual_sender_carries_factory_fields() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    let account = account();

    let receipt = submitter(&bundler, &chain)
        .submit(&account, &[Call::noop()], None)
        .await
        .unwrap();

    assert!(receipt.success);
    let sent = bundler.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender, account.address);
    assert_eq!(sent[0].factory, Some(account.factory()));
    assert_eq!(sent[0].factory_data, Some(account.factory_data().unwrap()));
    assert_eq!(bundler.estimates(), 1);
}

#[tokio::test]
async fn deployed_sender_omits_factory_and_uses_chain_nonce() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    let account = account();
    chain.deploy(account.address);
    chain.set_nonce(account.address, U256::from(7));

    submitter(&bundler, &chain)
        .submit(&account, &[Call::noop()], None)
        .await
        .unwrap();

    let op = &bundler.sent()[0];
    assert!(op.factory.is_none());
    assert!(op.init_code().is_empty());
    assert_eq!(op.nonce, U256::from(7));
}

#[tokio::test]
async fn fast_quote_unless_overridden() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    let account = account();
    let submitter = submitter(&bundler, &chain);

    submitter.submit(&account, &[Call::noop()], None).await.unwrap();
    let fees = FeeQuote::new(U256::from(9), U256::from(1));
    submitter
        .submit(&account, &[Call::noop()], Some(fees))
        .await
        .unwrap();

    let sent = bundler.sent();
    assert_eq!(sent[0].max_fee_per_gas, bundler.quotes().fast.max_fee_per_gas);
    assert_eq!(sent[1].max_fee_per_gas, U256::from(9));
    assert_eq!(sent[1].max_priority_fee_per_gas, U256::from(1));
}

#[tokio::test]
async fn signature_is_the_owner_over_the_operation_hash() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    let account = account();

    submitter(&bundler, &chain)
        .submit(&account, &[Call::noop()], None)
        .await
        .unwrap();

    let op = &bundler.sent()[0];
    let hash = op.hash(account.environment.entry_point, CHAIN_ID);
    let signature = ethers::types::Signature::try_from(op.signature.as_ref()).unwrap();
    assert_eq!(signature.recover(hash.as_bytes()).unwrap(), account.owner());
}

#[tokio::test]
async fn policy_id_routes_through_paymaster() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));

    submitter(&bundler, &chain)
        .with_paymaster_policy("sp_crowd")
        .submit(&account(), &[Call::noop()], None)
        .await
        .unwrap();

    assert_eq!(bundler.sponsor_policies(), vec![Some("sp_crowd".to_string())]);
    assert_eq!(bundler.estimates(), 0);
    assert_eq!(bundler.sent()[0].paymaster, Some(Address::repeat_byte(0x9a)));
}

#[tokio::test]
async fn polls_until_the_receipt_arrives() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    bundler.pending_for(3);

    submitter(&bundler, &chain)
        .submit(&account(), &[Call::noop()], None)
        .await
        .unwrap();
    assert_eq!(bundler.receipt_polls(), 4);
}

#[tokio::test]
async fn receipt_timeout_is_opt_in() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    bundler.pending_for(usize::MAX);

    let result = submitter(&bundler, &chain)
        .with_receipt_timeout(Some(Duration::from_millis(20)))
        .submit(&account(), &[Call::noop()], None)
        .await;
    assert!(matches!(result, Err(BundlerError::ReceiptTimeout(_))));
}

#[tokio::test]
async fn reverted_operation_is_classified_from_its_reason() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    bundler.revert_with("AlreadyVoted()");

    let err = submitter(&bundler, &chain)
        .submit(&account(), &[Call::noop()], None)
        .await
        .unwrap_err();
    assert_eq!(classify(&err), ErrorKind::AlreadyVoted);
}

#[tokio::test]
async fn deploy_moves_status_to_deployed() {
    let sender = Arc::new(NullSender::new());
    let deployer = AccountDeployer::new(sender.clone());
    let tracker = DeploymentTracker::default();
    let account = account();

    deployer.deploy(&account, &tracker).await.unwrap();
    assert_eq!(tracker.status(), DeploymentStatus::Deployed);

    let submissions = sender.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1, vec![Call::noop()]);

    // a second deploy is refused without submitting
    assert!(deployer.deploy(&account, &tracker).await.is_err());
    assert_eq!(sender.submissions().len(), 1);
}

#[tokio::test]
async fn failed_deploy_rolls_back_to_counterfactual() {
    let sender = Arc::new(NullSender::new());
    sender.fail_with(-32500, "AA21 didn't pay prefund");
    let deployer = AccountDeployer::new(sender.clone());
    let tracker = DeploymentTracker::default();

    let err = deployer.deploy(&account(), &tracker).await.unwrap_err();
    assert_eq!(classify(&err), ErrorKind::InsufficientBalance);
    assert_eq!(tracker.status(), DeploymentStatus::Counterfactual);
}

#[tokio::test]
async fn bundler_rejection_surfaces_as_rpc_error() {
    let bundler = Arc::new(NullBundler::new());
    let chain = Arc::new(NullChain::new(CHAIN_ID));
    bundler.fail_send(-32602, "AA25 invalid account nonce");

    let err = submitter(&bundler, &chain)
        .submit(&account(), &[Call::noop()], None)
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32602));
    assert_eq!(classify(&err), ErrorKind::BadNonce);
}
