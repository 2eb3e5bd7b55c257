use proptest::prelude::*;

use ethers::types::{Address, U256};

use crowd_delegation::{Caveat, CaveatBuilder, DelegationError};
use crowd_types::DelegatorEnvironment;

fn environment() -> DelegatorEnvironment {
    let mut env = DelegatorEnvironment::default();
    for (i, name) in [
        "AllowedTargetsEnforcer",
        "AllowedMethodsEnforcer",
        "ValueLteEnforcer",
        "TimestampEnforcer",
        "LimitedCallsEnforcer",
    ]
    .into_iter()
    .enumerate()
    {
        env.caveat_enforcers
            .insert(name.to_string(), Address::from_low_u64_be(i as u64 + 1));
    }
    env
}

fn single(caveats: Vec<Caveat>) -> Caveat {
    assert_eq!(caveats.len(), 1);
    caveats.into_iter().next().unwrap()
}

proptest! {
    /// Target terms are the addresses packed back to back, in order.
    #[test]
    fn targets_pack_twenty_bytes_each(targets in prop::collection::vec(prop::array::uniform20(0u8..), 1..6)) {
        let env = environment();
        let addresses: Vec<Address> = targets.iter().map(|t| Address::from(*t)).collect();
        let caveat = single(CaveatBuilder::new(&env).allowed_targets(&addresses).unwrap().build());

        prop_assert_eq!(caveat.enforcer, Address::from_low_u64_be(1));
        prop_assert_eq!(caveat.terms.len(), 20 * addresses.len());
        for (chunk, address) in caveat.terms.chunks(20).zip(&addresses) {
            prop_assert_eq!(chunk, address.as_bytes());
        }
        prop_assert!(caveat.args.is_empty());
    }

    /// Hex selectors pass through unchanged, four bytes each.
    #[test]
    fn hex_selectors_pack_four_bytes_each(selectors in prop::collection::vec(any::<[u8; 4]>(), 1..6)) {
        let env = environment();
        let methods: Vec<String> = selectors.iter().map(|s| format!("0x{}", hex::encode(s))).collect();
        let refs: Vec<&str> = methods.iter().map(String::as_str).collect();
        let caveat = single(CaveatBuilder::new(&env).allowed_methods(&refs).unwrap().build());

        prop_assert_eq!(caveat.terms.to_vec(), selectors.concat());
    }

    /// Value caps and call limits are one big-endian uint256 word.
    #[test]
    fn uint_terms_are_one_word(value in any::<u128>(), limit in any::<u64>()) {
        let env = environment();
        let caveats = CaveatBuilder::new(&env)
            .value_lte(U256::from(value))
            .unwrap()
            .limited_calls(limit)
            .unwrap()
            .build();

        prop_assert_eq!(caveats.len(), 2);
        prop_assert_eq!(U256::from_big_endian(&caveats[0].terms), U256::from(value));
        prop_assert_eq!(U256::from_big_endian(&caveats[1].terms), U256::from(limit));
        prop_assert!(caveats.iter().all(|c| c.terms.len() == 32));
    }

    /// A window is two packed uint128s; an inverted window is rejected.
    #[test]
    fn timestamp_window_layout(after in 1u128..u128::MAX / 2, span in 1u128..1_000_000) {
        let env = environment();
        let before = after + span;
        let caveat = single(CaveatBuilder::new(&env).timestamp(after, before).unwrap().build());

        prop_assert_eq!(&caveat.terms[..16], &after.to_be_bytes()[..]);
        prop_assert_eq!(&caveat.terms[16..], &before.to_be_bytes()[..]);
        prop_assert!(
            matches!(
                CaveatBuilder::new(&env).timestamp(before, after),
                Err(DelegationError::InvalidWindow { .. })
            ),
            "inverted window accepted"
        );
    }
}
