//! Verifiable randomness: request side and word interpretation.
//!
//! ```text
//!   start_draw ──request_random_words(cfg)──► coordinator
//!        ▲                                        │ (later block)
//!        └──── fulfill_random_words(id, words) ◄──┘
//! ```

use ink::env::call::{build_call, ExecutionInput, Selector};
use ink::env::DefaultEnvironment;
use ink::primitives::AccountId;
use primitive_types::U256;

use crate::constants::{DEFAULT_CALLBACK_GAS_LIMIT, DEFAULT_NUM_WORDS, DEFAULT_REQUEST_CONFIRMATIONS};
use crate::Error;

pub type RequestId = u64;

/// One 256-bit random value, big-endian.
pub type RandomWord = [u8; 32];

/// Parameters forwarded with every randomness request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct VrfConfig {
    /// Domain-separation key of the proving key.
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl VrfConfig {
    pub fn new(key_hash: [u8; 32], subscription_id: u64) -> Self {
        Self {
            key_hash,
            subscription_id,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            num_words: DEFAULT_NUM_WORDS,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.num_words == 0 || self.request_confirmations == 0 || self.callback_gas_limit == 0 {
            return Err(Error::RangeError);
        }
        Ok(())
    }
}

/// Request half of the oracle protocol. The callback arrives as a separate
/// message on the engine.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, config: &VrfConfig) -> Result<RequestId, Error>;
}

/// Coordinator contract reached through a raw selector call.
pub struct VrfCoordinator {
    address: AccountId,
}

impl VrfCoordinator {
    pub fn at(address: AccountId) -> Self {
        Self { address }
    }
}

impl RandomnessOracle for VrfCoordinator {
    fn request_random_words(&mut self, config: &VrfConfig) -> Result<RequestId, Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(self.address)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("request_random_words")))
                    .push_arg(config.key_hash)
                    .push_arg(config.subscription_id)
                    .push_arg(config.request_confirmations)
                    .push_arg(config.callback_gas_limit)
                    .push_arg(config.num_words),
            )
            .returns::<RequestId>()
            .try_invoke();

        match result {
            Ok(Ok(request_id)) => Ok(request_id),
            _ => Err(Error::OracleCallFailed),
        }
    }
}

/// `word mod len` as an index, `None` for an empty pool.
pub fn pick_index(word: &RandomWord, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let value = U256::from_big_endian(word);
    let index = value % U256::from(len);
    usize::try_from(index.low_u64()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(tail: u64) -> RandomWord {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&tail.to_be_bytes());
        w
    }

    #[test]
    fn small_words_index_directly() {
        assert_eq!(pick_index(&word(0), 3), Some(0));
        assert_eq!(pick_index(&word(4), 3), Some(1));
        assert_eq!(pick_index(&word(8), 3), Some(2));
    }

    #[test]
    fn full_width_word_reduces() {
        // 2^256 − 1 ≡ 0 (mod 3) and ≡ 3 (mod 4)
        let max = [0xff; 32];
        assert_eq!(pick_index(&max, 3), Some(0));
        assert_eq!(pick_index(&max, 4), Some(3));
    }

    #[test]
    fn empty_pool_has_no_index() {
        assert_eq!(pick_index(&word(5), 0), None);
    }

    #[test]
    fn defaults_validate() {
        let cfg = VrfConfig::new([7; 32], 42);
        assert_eq!(cfg.request_confirmations, 3);
        assert_eq!(cfg.callback_gas_limit, 200_000);
        assert_eq!(cfg.num_words, 1);
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(VrfConfig { num_words: 0, ..cfg }.validate(), Err(Error::RangeError));
    }
}
