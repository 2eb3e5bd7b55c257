use std::sync::Arc;

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};

use crowd_account::create_smart_account;
use crowd_dao::contract::encode_activity;
use crowd_dao::{ActivityQueries, BatchStatus, DaoContract, DaoError, DaoReader, DaoWriter};
use crowd_nullables::{NullChain, NullNotifier, NullSender};
use crowd_types::{Activity, Call, DelegatorEnvironment};

const DAO: Address = Address::repeat_byte(0xda);

fn activity(id: u64) -> Activity {
    Activity {
        id,
        creator: Address::repeat_byte(0xc0),
        description: format!("plant {id} trees"),
        amount: U256::from(100 * id),
        votes: U256::from(id),
        active: true,
        completed: false,
    }
}

fn chain_with(ids: &[u64]) -> Arc<NullChain> {
    let chain = Arc::new(NullChain::new(31337));
    let contract = DaoContract::new(DAO);
    for &id in ids {
        chain.respond(DAO, contract.get_activity_data(id).unwrap(), encode_activity(&activity(id)));
    }
    chain
}

fn queries(chain: &Arc<NullChain>) -> ActivityQueries {
    ActivityQueries::new(DaoReader::new(DaoContract::new(DAO), chain.clone()))
}

#[tokio::test]
async fn batch_keeps_request_order() {
    let chain = chain_with(&[1, 2, 3]);
    let queries = queries(&chain);

    let batch = queries.fetch_batch(&[3, 1, 2]).await;

    let ids: Vec<u64> = batch.activities().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(batch.status, BatchStatus { loading: false, error: false });
    assert_eq!(*batch.activities()[0], activity(3));
}

#[tokio::test]
async fn one_failed_fetch_flags_the_batch_but_keeps_the_rest() {
    let chain = chain_with(&[1, 3]);
    chain.fail(DAO, DaoContract::new(DAO).get_activity_data(2).unwrap(), "execution reverted");
    let queries = queries(&chain);
    let mut status = queries.subscribe();

    let batch = queries.fetch_batch(&[1, 2, 3]).await;

    assert_eq!(batch.status, BatchStatus { loading: false, error: true });
    assert_eq!(batch.activities().len(), 2);
    assert!(batch.results[1].1.is_err());
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), batch.status);
}

#[tokio::test]
async fn batch_keeps_loading_until_the_slowest_fetch_settles() {
    let chain = chain_with(&[1]);
    let contract = DaoContract::new(DAO);
    chain.fail(DAO, contract.get_activity_data(2).unwrap(), "execution reverted");
    let release = chain.hold(DAO, contract.get_activity_data(1).unwrap());
    let queries = queries(&chain);
    let mut status = queries.subscribe();

    let (batch, seen) = tokio::join!(queries.fetch_batch(&[1, 2]), async {
        let seen = *status.wait_for(|s| s.error).await.unwrap();
        release.notify_one();
        seen
    });

    assert_eq!(seen, BatchStatus { loading: true, error: true });
    assert_eq!(batch.status, BatchStatus { loading: false, error: true });
    assert_eq!(batch.activities().len(), 1);
    assert_eq!(*status.borrow(), batch.status);
}

#[tokio::test]
async fn missing_activity_is_not_found() {
    let chain = Arc::new(NullChain::new(31337));
    let contract = DaoContract::new(DAO);
    let empty = Activity {
        creator: Address::zero(),
        ..activity(9)
    };
    chain.respond(DAO, contract.get_activity_data(9).unwrap(), encode_activity(&empty));

    let batch = queries(&chain).fetch_batch(&[9]).await;
    assert!(matches!(batch.results[0].1, Err(DaoError::NotFound(9))));
    assert!(batch.status.error);
}

#[tokio::test]
async fn fresh_cache_entries_skip_the_chain() {
    let chain = chain_with(&[1, 2]);
    let queries = queries(&chain);

    queries.fetch_batch(&[1, 2]).await;
    assert_eq!(chain.calls().len(), 2);

    let again = queries.fetch_batch(&[1, 2]).await;
    assert_eq!(again.activities().len(), 2);
    assert_eq!(chain.calls().len(), 2);

    queries.cache().invalidate(1);
    queries.fetch_batch(&[1, 2]).await;
    assert_eq!(chain.calls().len(), 3);
}

#[tokio::test]
async fn empty_batch_is_not_loading() {
    let chain = Arc::new(NullChain::new(31337));
    let batch = queries(&chain).fetch_batch(&[]).await;
    assert!(batch.results.is_empty());
    assert_eq!(batch.status, BatchStatus::default());
}

#[tokio::test]
async fn count_and_vote_reads() {
    let chain = Arc::new(NullChain::new(31337));
    let contract = DaoContract::new(DAO);
    let voter = Address::repeat_byte(0x77);
    chain.respond(
        DAO,
        contract.activity_count_data().unwrap(),
        Bytes::from(ethers::abi::encode(&[Token::Uint(U256::from(12))])),
    );
    chain.respond(
        DAO,
        contract.has_voted_data(4, voter).unwrap(),
        Bytes::from(ethers::abi::encode(&[Token::Bool(true)])),
    );
    let reader = DaoReader::new(contract, chain.clone());

    assert_eq!(reader.activity_count().await.unwrap(), 12);
    assert!(reader.has_voted(4, voter).await.unwrap());
    assert!(reader.has_voted(5, voter).await.is_err());
}

fn environment() -> DelegatorEnvironment {
    DelegatorEnvironment {
        delegation_manager: Address::repeat_byte(0x01),
        simple_factory: Address::repeat_byte(0x02),
        hybrid_implementation: Address::repeat_byte(0x03),
        proxy_creation_code: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
        ..DelegatorEnvironment::default()
    }
}

#[tokio::test]
async fn writes_submit_one_call_and_notify() {
    let sender = Arc::new(NullSender::new());
    let notifier = Arc::new(NullNotifier::new());
    let contract = DaoContract::new(DAO);
    let writer = DaoWriter::new(contract, sender.clone(), notifier.clone());
    let account = create_smart_account(environment()).unwrap();
    let to = Address::repeat_byte(0x42);

    writer.create_activity(&account, "clean the beach", U256::from(5)).await.unwrap();
    writer.vote(&account, 1, true).await.unwrap();
    writer.transfer(&account, to, U256::from(10)).await.unwrap();
    writer.transfer_native(&account, to, U256::from(11)).await.unwrap();

    let submissions = sender.submissions();
    assert_eq!(submissions.len(), 4);
    assert!(submissions.iter().all(|(from, calls)| *from == account.address && calls.len() == 1));
    assert_eq!(submissions[0].1[0], contract.create_activity("clean the beach", U256::from(5)).unwrap());
    assert_eq!(submissions[1].1[0], contract.vote(1, true).unwrap());
    assert_eq!(submissions[3].1[0], Call::new(to).with_value(U256::from(11)));
    assert_eq!(
        notifier.titles(),
        vec!["Activity created", "Vote recorded", "Transfer sent", "Transfer sent"]
    );
}

#[tokio::test]
async fn failed_write_raises_no_success_notice() {
    let sender = Arc::new(NullSender::new());
    sender.fail_with(-32500, "execution reverted: AlreadyVoted()");
    let notifier = Arc::new(NullNotifier::new());
    let writer = DaoWriter::new(DaoContract::new(DAO), sender.clone(), notifier.clone());
    let account = create_smart_account(environment()).unwrap();

    let err = writer.vote(&account, 1, false).await.unwrap_err();
    assert!(matches!(err, DaoError::Bundler(_)));
    assert!(notifier.notices().is_empty());
}
