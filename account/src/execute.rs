//! ERC-7579 `execute(bytes32 mode, bytes executionCalldata)` encoding.

use ethers::abi::Token;
use ethers::types::{Bytes, H256};

use crowd_types::abi::encode_call;
use crowd_types::Call;

use crate::error::AccountError;

pub const EXECUTE_SIGNATURE: &str = "function execute(bytes32,bytes)";

/// Call type byte of the execution mode word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Single,
    Batch,
}

impl ExecutionMode {
    /// The 32-byte mode word: call type in the first byte, defaults elsewhere.
    pub fn word(&self) -> H256 {
        let mut word = [0u8; 32];
        if let Self::Batch = self {
            word[0] = 0x01;
        }
        H256::from(word)
    }
}

/// `abi.encodePacked(target, value, callData)`.
pub fn encode_single_execution(call: &Call) -> Bytes {
    let mut out = Vec::with_capacity(20 + 32 + call.data.len());
    out.extend_from_slice(call.to.as_bytes());
    let mut value = [0u8; 32];
    call.value.to_big_endian(&mut value);
    out.extend_from_slice(&value);
    out.extend_from_slice(&call.data);
    Bytes::from(out)
}

/// `abi.encode(Execution[])` with `Execution = (address, uint256, bytes)`.
pub fn encode_batch_execution(calls: &[Call]) -> Bytes {
    let executions = calls
        .iter()
        .map(|c| {
            Token::Tuple(vec![
                Token::Address(c.to),
                Token::Uint(c.value),
                Token::Bytes(c.data.to_vec()),
            ])
        })
        .collect();
    Bytes::from(ethers::abi::encode(&[Token::Array(executions)]))
}

/// Calldata for the account's `execute` entry: single mode for one call,
/// batch mode for several.
pub fn encode_execute(calls: &[Call]) -> Result<Bytes, AccountError> {
    let (mode, execution) = match calls {
        [] => return Err(AccountError::EmptyCalls),
        [call] => (ExecutionMode::Single, encode_single_execution(call)),
        many => (ExecutionMode::Batch, encode_batch_execution(many)),
    };
    Ok(encode_call(
        EXECUTE_SIGNATURE,
        &[
            Token::FixedBytes(mode.word().as_bytes().to_vec()),
            Token::Bytes(execution.to_vec()),
        ],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowd_types::abi::selector;
    use ethers::types::{Address, U256};

    #[test]
    fn single_execution_is_packed() {
        let call = Call::new(Address::repeat_byte(0xaa))
            .with_value(U256::from(7))
            .with_data(vec![0xde, 0xad]);
        let packed = encode_single_execution(&call);
        assert_eq!(packed.len(), 20 + 32 + 2);
        assert_eq!(&packed[..20], Address::repeat_byte(0xaa).as_bytes());
        assert_eq!(packed[51], 7);
        assert_eq!(&packed[52..], &[0xde, 0xad]);
    }

    #[test]
    fn mode_word_encodes_call_type() {
        assert_eq!(ExecutionMode::Single.word(), H256::zero());
        assert_eq!(ExecutionMode::Batch.word().as_bytes()[0], 1);
    }

    #[test]
    fn execute_picks_mode_by_call_count() {
        let sel = selector(EXECUTE_SIGNATURE).unwrap();
        let one = encode_execute(&[Call::noop()]).unwrap();
        assert_eq!(&one[..4], &sel);
        assert_eq!(one[4], 0x00);

        let two = encode_execute(&[Call::noop(), Call::noop()]).unwrap();
        assert_eq!(two[4], 0x01);
        assert!(matches!(encode_execute(&[]), Err(AccountError::EmptyCalls)));
    }
}
