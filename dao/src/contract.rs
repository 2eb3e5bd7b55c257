//! The activity contract's ABI.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};

use crowd_types::abi::{decode_output, encode_call};
use crowd_types::{Activity, Call};

use crate::error::DaoError;

pub const GET_ACTIVITY: &str =
    "function getActivity(uint256) view returns (address,string,uint256,uint256,bool,bool)";
pub const ACTIVITY_COUNT: &str = "function activityCount() view returns (uint256)";
pub const HAS_VOTED: &str = "function hasVoted(uint256,address) view returns (bool)";
pub const CREATE_ACTIVITY: &str = "function createActivity(string,uint256)";
pub const VOTE: &str = "function vote(uint256,bool)";
pub const TRANSFER: &str = "function transfer(address,uint256)";

/// The DAO contract at a fixed address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DaoContract {
    pub address: Address,
}

impl DaoContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn get_activity_data(&self, id: u64) -> Result<Bytes, DaoError> {
        Ok(encode_call(GET_ACTIVITY, &[Token::Uint(U256::from(id))])?)
    }

    pub fn activity_count_data(&self) -> Result<Bytes, DaoError> {
        Ok(encode_call(ACTIVITY_COUNT, &[])?)
    }

    pub fn has_voted_data(&self, id: u64, voter: Address) -> Result<Bytes, DaoError> {
        Ok(encode_call(
            HAS_VOTED,
            &[Token::Uint(U256::from(id)), Token::Address(voter)],
        )?)
    }

    pub fn decode_activity(&self, id: u64, output: &[u8]) -> Result<Activity, DaoError> {
        let decode_err = |reason: &str| DaoError::Decode("getActivity", reason.to_string());
        let tokens = decode_output(GET_ACTIVITY, output).map_err(|e| decode_err(&e.to_string()))?;
        let mut it = tokens.into_iter();
        let mut next = || it.next().ok_or_else(|| decode_err("missing field"));

        let creator = next()?.into_address().ok_or_else(|| decode_err("creator"))?;
        let description = next()?.into_string().ok_or_else(|| decode_err("description"))?;
        let amount = next()?.into_uint().ok_or_else(|| decode_err("amount"))?;
        let votes = next()?.into_uint().ok_or_else(|| decode_err("votes"))?;
        let active = next()?.into_bool().ok_or_else(|| decode_err("active"))?;
        let completed = next()?.into_bool().ok_or_else(|| decode_err("completed"))?;

        if creator.is_zero() {
            return Err(DaoError::NotFound(id));
        }
        Ok(Activity::from_tuple(
            id,
            (creator, description, amount, votes, active, completed),
        ))
    }

    pub fn decode_uint(&self, what: &'static str, signature: &str, output: &[u8]) -> Result<U256, DaoError> {
        decode_output(signature, output)
            .map_err(|e| DaoError::Decode(what, e.to_string()))?
            .into_iter()
            .next()
            .and_then(|t| t.into_uint())
            .ok_or_else(|| DaoError::Decode(what, "missing value".into()))
    }

    pub fn decode_bool(&self, what: &'static str, signature: &str, output: &[u8]) -> Result<bool, DaoError> {
        decode_output(signature, output)
            .map_err(|e| DaoError::Decode(what, e.to_string()))?
            .into_iter()
            .next()
            .and_then(|t| t.into_bool())
            .ok_or_else(|| DaoError::Decode(what, "missing value".into()))
    }

    pub fn create_activity(&self, description: &str, amount: U256) -> Result<Call, DaoError> {
        let data = encode_call(
            CREATE_ACTIVITY,
            &[Token::String(description.to_string()), Token::Uint(amount)],
        )?;
        Ok(Call::new(self.address).with_data(data))
    }

    pub fn vote(&self, id: u64, support: bool) -> Result<Call, DaoError> {
        let data = encode_call(VOTE, &[Token::Uint(U256::from(id)), Token::Bool(support)])?;
        Ok(Call::new(self.address).with_data(data))
    }

    pub fn transfer(&self, to: Address, amount: U256) -> Result<Call, DaoError> {
        let data = encode_call(TRANSFER, &[Token::Address(to), Token::Uint(amount)])?;
        Ok(Call::new(self.address).with_data(data))
    }
}

/// Encoded `getActivity` return data, for tests and fixtures.
pub fn encode_activity(activity: &Activity) -> Bytes {
    Bytes::from(ethers::abi::encode(&[
        Token::Address(activity.creator),
        Token::String(activity.description.clone()),
        Token::Uint(activity.amount),
        Token::Uint(activity.votes),
        Token::Bool(activity.active),
        Token::Bool(activity.completed),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowd_types::abi::selector;

    fn activity() -> Activity {
        Activity {
            id: 7,
            creator: Address::repeat_byte(0xc0),
            description: "clean the park".into(),
            amount: U256::exp10(18),
            votes: U256::from(3),
            active: true,
            completed: false,
        }
    }

    #[test]
    fn decodes_activity_tuple() {
        let dao = DaoContract::new(Address::repeat_byte(0xda));
        let decoded = dao.decode_activity(7, &encode_activity(&activity())).unwrap();
        assert_eq!(decoded, activity());
    }

    #[test]
    fn zero_creator_means_missing() {
        let dao = DaoContract::new(Address::repeat_byte(0xda));
        let empty = Activity {
            creator: Address::zero(),
            ..activity()
        };
        assert!(matches!(
            dao.decode_activity(9, &encode_activity(&empty)),
            Err(DaoError::NotFound(9))
        ));
    }

    #[test]
    fn garbage_output_is_a_decode_error() {
        let dao = DaoContract::new(Address::repeat_byte(0xda));
        assert!(matches!(
            dao.decode_activity(1, &[0x01, 0x02]),
            Err(DaoError::Decode("getActivity", _))
        ));
    }

    #[test]
    fn write_calls_target_the_contract() {
        let dao = DaoContract::new(Address::repeat_byte(0xda));
        let vote = dao.vote(1, true).unwrap();
        assert_eq!(vote.to, dao.address);
        assert!(vote.value.is_zero());
        assert_eq!(&vote.data[..4], &selector(VOTE).unwrap());

        let create = dao.create_activity("x", U256::one()).unwrap();
        assert_eq!(&create.data[..4], &selector(CREATE_ACTIVITY).unwrap());
        let transfer = dao.transfer(Address::repeat_byte(1), U256::one()).unwrap();
        assert_eq!(&transfer.data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    }
}
