//! Seams for contracts that consume the ledger.
//!
//! The draw engine, the bridge and the governance queue talk to the token
//! through these traits; on-chain they are backed by [`ReflectionTokenRef`],
//! in unit tests by in-memory doubles.

use ink::primitives::AccountId;

use crate::{Balance, Error, ReflectionTokenRef};

/// PSP22 surface used for balance reads and pull payments.
pub trait TokenLedger {
    fn balance_of(&self, account: AccountId) -> Balance;

    fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance;

    fn transfer(&mut self, to: AccountId, value: Balance) -> Result<(), Error>;

    fn transfer_from(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<(), Error>;
}

/// Rate setters reachable by the delayed-governance actor.
pub trait RateControl {
    fn set_tax_rate(&mut self, bps: u16) -> Result<(), Error>;

    fn set_reflection_rate(&mut self, bps: u16) -> Result<(), Error>;
}

impl TokenLedger for ReflectionTokenRef {
    fn balance_of(&self, account: AccountId) -> Balance {
        ReflectionTokenRef::balance_of(self, account)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance {
        ReflectionTokenRef::allowance(self, owner, spender)
    }

    fn transfer(&mut self, to: AccountId, value: Balance) -> Result<(), Error> {
        ReflectionTokenRef::transfer(self, to, value)
    }

    fn transfer_from(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
        ReflectionTokenRef::transfer_from(self, from, to, value)
    }
}

impl RateControl for ReflectionTokenRef {
    fn set_tax_rate(&mut self, bps: u16) -> Result<(), Error> {
        ReflectionTokenRef::set_tax_rate(self, bps)
    }

    fn set_reflection_rate(&mut self, bps: u16) -> Result<(), Error> {
        ReflectionTokenRef::set_reflection_rate(self, bps)
    }
}

/// Bind a ledger reference to a deployed token address.
pub fn token_at(address: AccountId) -> ReflectionTokenRef {
    <ReflectionTokenRef as ink::env::call::FromAccountId<ink::env::DefaultEnvironment>>::from_account_id(
        address,
    )
}
