#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub use self::token_bridge::{TokenBridge, TokenBridgeRef};

/// # Lucky Seven — Token Bridge (lock side)
///
/// Holders lock tokens here to have them mirrored on another chain; the
/// relayer-owner releases them again when the mirror is burned.
///
/// ```text
///   holder ──approve──► token
///   holder ──lock(amount, dest)──► bridge ──transfer_from(holder, bridge)──► token
///   owner  ──unlock(to, amount)──► bridge ──transfer(to)──────────────────► token
/// ```
///
/// The pull runs through the taxed ledger path, so the bridge credits what
/// actually arrived (balance delta), not the requested amount.
#[ink::contract]
pub mod token_bridge {
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;
    use reflection_token::{token_at, TokenLedger};

    /// Largest destination address accepted (bytes).
    pub const MAX_DESTINATION_LEN: usize = 64;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct TokenBridge {
        owner: AccountId,
        token: AccountId,
        cap: Balance,
        total_locked: Balance,
        locked: Mapping<AccountId, Balance>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Locked {
        #[ink(topic)]
        from: AccountId,
        amount: Balance,
        destination: Vec<u8>,
    }

    #[ink(event)]
    pub struct Unlocked {
        #[ink(topic)]
        to: AccountId,
        amount: Balance,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        AccessDenied,
        /// Zero amount or malformed destination.
        RangeError,
        /// Lock would push `total_locked` past the cap.
        CapExceeded,
        /// Unlock larger than what is held.
        InsufficientLocked,
        Overflow,
        Ledger(reflection_token::Error),
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl TokenBridge {
        #[ink(constructor)]
        pub fn new(token: AccountId, cap: Balance) -> Self {
            Self {
                owner: Self::env().caller(),
                token,
                cap,
                total_locked: 0,
                locked: Mapping::default(),
            }
        }

        #[ink(message)]
        pub fn lock(&mut self, amount: Balance, destination: Vec<u8>) -> Result<Balance, Error> {
            let mut token = token_at(self.token);
            self.lock_with(&mut token, amount, destination)
        }

        /// Owner only.
        #[ink(message)]
        pub fn unlock(&mut self, to: AccountId, amount: Balance) -> Result<(), Error> {
            let mut token = token_at(self.token);
            self.unlock_with(&mut token, to, amount)
        }

        #[ink(message)]
        pub fn total_locked(&self) -> Balance {
            self.total_locked
        }

        /// Cumulative amount received from `account`; unlocks are not attributed.
        #[ink(message)]
        pub fn locked_of(&self, account: AccountId) -> Balance {
            self.locked.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn cap(&self) -> Balance {
            self.cap
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.owner = new_owner;
            Ok(())
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn lock_with<L: TokenLedger>(
            &mut self,
            ledger: &mut L,
            amount: Balance,
            destination: Vec<u8>,
        ) -> Result<Balance, Error> {
            if amount == 0 || destination.is_empty() || destination.len() > MAX_DESTINATION_LEN {
                return Err(Error::RangeError);
            }
            let projected = self.total_locked.checked_add(amount).ok_or(Error::Overflow)?;
            if projected > self.cap {
                return Err(Error::CapExceeded);
            }

            let caller = self.env().caller();
            let bridge = self.env().account_id();
            let before = ledger.balance_of(bridge);
            ledger
                .transfer_from(caller, bridge, amount)
                .map_err(Error::Ledger)?;
            let received = ledger
                .balance_of(bridge)
                .checked_sub(before)
                .ok_or(Error::Overflow)?;

            self.total_locked = self.total_locked.checked_add(received).ok_or(Error::Overflow)?;
            let mine = self.locked_of(caller).checked_add(received).ok_or(Error::Overflow)?;
            self.locked.insert(caller, &mine);

            self.env().emit_event(Locked {
                from: caller,
                amount: received,
                destination,
            });
            Ok(received)
        }

        fn unlock_with<L: TokenLedger>(&mut self, ledger: &mut L, to: AccountId, amount: Balance) -> Result<(), Error> {
            self.only_owner()?;
            if amount > self.total_locked {
                return Err(Error::InsufficientLocked);
            }
            ledger.transfer(to, amount).map_err(Error::Ledger)?;
            self.total_locked -= amount;
            self.env().emit_event(Unlocked { to, amount });
            Ok(())
        }

        fn only_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.owner {
                return Err(Error::AccessDenied);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
