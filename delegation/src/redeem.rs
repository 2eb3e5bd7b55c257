//! `DelegationManager.redeemDelegations` calldata.

use ethers::abi::Token;
use ethers::types::Bytes;

use crowd_types::abi::encode_call;
use crowd_types::Call;

use crate::delegation::Delegation;
use crate::error::DelegationError;

pub const REDEEM_SIGNATURE: &str = "function redeemDelegations(bytes[],bytes32[],bytes[])";

/// `abi.encode(Delegation[])`, leaf delegation first.
pub fn encode_permission_context(chain: &[Delegation]) -> Bytes {
    let delegations = chain.iter().map(Delegation::to_token).collect();
    Bytes::from(ethers::abi::encode(&[Token::Array(delegations)]))
}

/// Redeem `chain` to run one `execution` as the root delegator.
pub fn encode_redeem(chain: &[Delegation], execution: &Call) -> Result<Bytes, DelegationError> {
    if chain.is_empty() {
        return Err(DelegationError::EmptyChain);
    }
    let mut packed = Vec::with_capacity(52 + execution.data.len());
    packed.extend_from_slice(execution.to.as_bytes());
    let mut value = [0u8; 32];
    execution.value.to_big_endian(&mut value);
    packed.extend_from_slice(&value);
    packed.extend_from_slice(&execution.data);

    Ok(encode_call(
        REDEEM_SIGNATURE,
        &[
            Token::Array(vec![Token::Bytes(encode_permission_context(chain).to_vec())]),
            // single call type, default exec type
            Token::Array(vec![Token::FixedBytes(vec![0u8; 32])]),
            Token::Array(vec![Token::Bytes(packed)]),
        ],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::create_root_delegation;
    use crowd_types::abi::{parse_function, selector};
    use ethers::types::{Address, U256};

    #[test]
    fn redeem_wraps_one_context_mode_and_execution() {
        let d = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        let call = Call::new(Address::repeat_byte(9))
            .with_value(U256::from(1))
            .with_data(vec![0xab]);
        let data = encode_redeem(&[d.clone()], &call).unwrap();
        assert_eq!(&data[..4], &selector(REDEEM_SIGNATURE).unwrap());

        let tokens = parse_function(REDEEM_SIGNATURE)
            .unwrap()
            .decode_input(&data[4..])
            .unwrap();
        let contexts = tokens[0].clone().into_array().unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(
            contexts[0].clone().into_bytes().unwrap(),
            encode_permission_context(&[d]).to_vec()
        );
        let executions = tokens[2].clone().into_array().unwrap();
        let packed = executions[0].clone().into_bytes().unwrap();
        assert_eq!(&packed[..20], Address::repeat_byte(9).as_bytes());
        assert_eq!(packed.len(), 53);
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(matches!(
            encode_redeem(&[], &Call::noop()),
            Err(DelegationError::EmptyChain)
        ));
    }
}
