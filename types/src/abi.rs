//! Human-readable ABI helpers.
//!
//! Contracts are described by their Solidity signatures
//! (`"function getActivity(uint256) view returns (address,string)"`) rather
//! than by generated bindings.

use ethers::abi::{parse_abi, Function, Token};
use ethers::types::Bytes;

use crate::error::CrowdError;

/// Parse a single `function ...` signature.
pub fn parse_function(signature: &str) -> Result<Function, CrowdError> {
    let abi = parse_abi(&[signature]).map_err(|e| CrowdError::Abi(format!("{signature}: {e}")))?;
    abi.functions()
        .next()
        .cloned()
        .ok_or_else(|| CrowdError::Abi(format!("{signature}: not a function")))
}

/// Selector plus ABI-encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Result<Bytes, CrowdError> {
    let function = parse_function(signature)?;
    function
        .encode_input(args)
        .map(Bytes::from)
        .map_err(|e| CrowdError::Abi(format!("{}: {e}", function.name)))
}

/// Decode a call's return data into tokens.
pub fn decode_output(signature: &str, data: &[u8]) -> Result<Vec<Token>, CrowdError> {
    let function = parse_function(signature)?;
    function
        .decode_output(data)
        .map_err(|e| CrowdError::Abi(format!("{}: {e}", function.name)))
}

/// The 4-byte selector of a signature.
pub fn selector(signature: &str) -> Result<[u8; 4], CrowdError> {
    Ok(parse_function(signature)?.short_signature())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, U256};

    #[test]
    fn transfer_selector_matches_erc20() {
        let sel = selector("function transfer(address,uint256) returns (bool)").unwrap();
        assert_eq!(sel, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn encodes_selector_then_arguments() {
        let data = encode_call(
            "function transfer(address,uint256)",
            &[
                Token::Address(Address::repeat_byte(1)),
                Token::Uint(U256::from(5)),
            ],
        )
        .unwrap();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data[4 + 63], 5);
    }

    #[test]
    fn rejects_wrong_argument_types() {
        let err = encode_call("function vote(uint256,bool)", &[Token::Bool(true)]);
        assert!(err.is_err());
    }
}
