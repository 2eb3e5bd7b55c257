use proptest::prelude::*;

use crowd_types::{Address, Bytes, Call, DeploymentStatus, Network, U256};

fn status() -> impl Strategy<Value = DeploymentStatus> {
    prop_oneof![
        Just(DeploymentStatus::Counterfactual),
        Just(DeploymentStatus::DeploymentInProgress),
        Just(DeploymentStatus::Deployed),
    ]
}

proptest! {
    /// Only a call with no target, value or data is a no-op.
    #[test]
    fn noop_only_when_everything_is_empty(
        to in prop::array::uniform20(0u8..),
        value in any::<u64>(),
        data in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let call = Call::new(Address::from(to))
            .with_value(U256::from(value))
            .with_data(data.clone());
        let empty = to == [0u8; 20] && value == 0 && data.is_empty();
        prop_assert_eq!(call.is_noop(), empty);
    }

    /// Calls survive a JSON trip unchanged.
    #[test]
    fn call_json_roundtrip(
        to in prop::array::uniform20(0u8..),
        value in any::<u128>(),
        data in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let call = Call::new(Address::from(to))
            .with_value(U256::from(value))
            .with_data(Bytes::from(data));
        let json = serde_json::to_string(&call).unwrap();
        let back: Call = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, call);
    }

    /// Status names parse back to the same status.
    #[test]
    fn status_names_parse_back(status in status()) {
        prop_assert_eq!(status.as_str().parse::<DeploymentStatus>().unwrap(), status);
        prop_assert_eq!(status.is_deployed(), status == DeploymentStatus::Deployed);
    }

    /// Looking a network up by chain id agrees with `chain_id`.
    #[test]
    fn chain_id_lookup_matches_network_ids(id in any::<u64>()) {
        let known = [Network::Sepolia, Network::FlowTestnet, Network::Dev]
            .into_iter()
            .find(|n| n.chain_id() == id);
        prop_assert_eq!(Network::from_chain_id(id), known);
    }
}
