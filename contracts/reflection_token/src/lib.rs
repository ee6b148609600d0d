#![cfg_attr(not(feature = "std"), no_std, no_main)]

mod errors;
mod guard;
pub mod ledger_api;
mod reflection;

pub use errors::Error;
pub use guard::Switches;
pub use ledger_api::{token_at, RateControl, TokenLedger};
pub use reflection::{Rates, TaxSplit};

pub use self::reflection_token::{ReflectionToken, ReflectionTokenRef};

pub type Balance = u128;

pub mod constants {
    use super::Balance;

    pub const ONE_TOKEN: Balance = 1_000_000_000_000_000_000;

    /// 777 777 777 tokens, minted once at genesis.
    pub const TOTAL_SUPPLY: Balance = 777_777_777 * ONE_TOKEN;

    /// Denominator for all basis-point calculations.
    pub const BPS_DENOMINATOR: Balance = 10_000;

    pub const DEFAULT_TAX_BPS: u16 = 200;
    pub const MAX_TAX_BPS: u16 = 300;

    pub const DEFAULT_REFLECTION_BPS: u16 = 50;
    pub const MAX_REFLECTION_BPS: u16 = 100;

    pub const DECIMALS: u8 = 18;

    /// Burn sink: …dEaD.  Transfers here are never taxed.
    pub const BURN_SINK: [u8; 32] = [
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0xdE, 0xaD,
    ];
}

/// Roles and system accounts, injected at construction and changed only
/// through owner setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct TokenConfig {
    pub owner: ink::primitives::AccountId,
    /// May trip (never reset) the circuit breaker.
    pub emergency_admin: Option<ink::primitives::AccountId>,
    /// Governance delay queue allowed to change rates.
    pub governance: Option<ink::primitives::AccountId>,
    pub treasury: ink::primitives::AccountId,
    pub prize_vault: ink::primitives::AccountId,
}

/// # Lucky Seven — Reflection Token Ledger
///
/// **Role:** Ground-truth balance ledger, tax collector and reflection
/// engine.  Feeds the prize vault that the draw engine pays winners from.
///
/// ## Transfer path
///
/// ```text
///   caller ──► guard (breaker → pause → blacklist from → blacklist to)
///          ──► balance check
///          ──► split  (net | treasury | vault | reflection reserve)
///          ──► debit sender snapshot @ old reflection_total
///          ──► shrink reflection_total
///          ──► credit recipient / treasury / vault / reserve @ new total
/// ```
///
/// Genesis mint (constructor) and transfers into `BURN_SINK` skip the split.
///
/// ## Default routing (2% tax, 0.5% reflection)
///
/// ```text
///   1 000 tokens sent
///   ├── 975   → recipient
///   ├──  10   → treasury      ⌊tax / 2⌋
///   ├──  10   → prize vault   tax − ⌊tax / 2⌋
///   └──   5   → reserve       (shrinks reflection_total)
/// ```
///
/// Raw balances always sum to `TOTAL_SUPPLY`; reflection only changes the
/// *reported* balance of non-excluded holders (`reflected_balance_of`).
#[ink::contract]
pub mod reflection_token {
    use crate::constants::*;
    use crate::reflection::{self, Rates, TaxSplit};
    use crate::{Error, Switches, TokenConfig};
    use ink::prelude::string::String;
    use ink::storage::Mapping;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct ReflectionToken {
        // ── Token metadata ────────────────────────────────────────────────
        name: String,
        symbol: String,
        total_supply: Balance,

        // ── Ledger ────────────────────────────────────────────────────────
        balances: Mapping<AccountId, Balance>,
        allowances: Mapping<(AccountId, AccountId), Balance>,

        // ── Roles & system accounts ───────────────────────────────────────
        config: TokenConfig,

        // ── Tax & reflection ──────────────────────────────────────────────
        rates: Rates,
        /// Shrinking denominator; see `reflection` module.
        reflection_total: Balance,
        /// Reflection units per non-excluded holder.
        snapshots: Mapping<AccountId, Balance>,
        /// Excluded account → reflection it had accrued when it was frozen.
        excluded: Mapping<AccountId, Balance>,

        // ── Safety ───────────────────────────────────────────────────────
        switches: Switches,
        blacklisted: Mapping<AccountId, ()>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        value: Balance,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        spender: AccountId,
        value: Balance,
    }

    /// Emitted once per taxed transfer, after the `Transfer` to the recipient.
    #[ink(event)]
    pub struct TaxDistributed {
        #[ink(topic)]
        from: AccountId,
        treasury_share: Balance,
        vault_share: Balance,
    }

    #[ink(event)]
    pub struct Reflected {
        #[ink(topic)]
        from: AccountId,
        amount: Balance,
        reflection_total: Balance,
    }

    #[ink(event)]
    pub struct RatesUpdated {
        #[ink(topic)]
        by: AccountId,
        tax_bps: u16,
        reflection_bps: u16,
    }

    #[ink(event)]
    pub struct ReflectionExclusionChanged {
        #[ink(topic)]
        account: AccountId,
        excluded: bool,
    }

    #[ink(event)]
    pub struct BlacklistUpdated {
        #[ink(topic)]
        account: AccountId,
        blacklisted: bool,
    }

    #[ink(event)]
    pub struct SwitchesChanged {
        #[ink(topic)]
        by: AccountId,
        paused: bool,
        circuit_breaker: bool,
    }

    #[ink(event)]
    pub struct ConfigUpdated {
        #[ink(topic)]
        by: AccountId,
        config: TokenConfig,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl ReflectionToken {
        /// Deploy the ledger.
        ///
        /// Mints `TOTAL_SUPPLY` to the deployer and excludes the treasury,
        /// the prize vault, the ledger's own reserve account and the burn
        /// sink from reflection.
        #[ink(constructor)]
        pub fn new(treasury: AccountId, prize_vault: AccountId, name: String, symbol: String) -> Self {
            let caller = Self::env().caller();
            let reserve = Self::env().account_id();

            let mut token = Self {
                name,
                symbol,
                total_supply: TOTAL_SUPPLY,
                balances: Mapping::default(),
                allowances: Mapping::default(),
                config: TokenConfig {
                    owner: caller,
                    emergency_admin: None,
                    governance: None,
                    treasury,
                    prize_vault,
                },
                rates: Rates::default(),
                reflection_total: reflection::initial_reflection_total(TOTAL_SUPPLY),
                snapshots: Mapping::default(),
                excluded: Mapping::default(),
                switches: Switches::default(),
                blacklisted: Mapping::default(),
            };

            for account in [treasury, prize_vault, reserve, AccountId::from(BURN_SINK)] {
                token.excluded.insert(account, &0);
            }

            token.balances.insert(caller, &TOTAL_SUPPLY);
            if !token.is_excluded(caller) {
                let snapshot =
                    reflection::snapshot_of(TOTAL_SUPPLY, token.reflection_total, TOTAL_SUPPLY)
                        .unwrap_or(token.reflection_total);
                token.snapshots.insert(caller, &snapshot);
            }

            Self::env().emit_event(Transfer {
                from: None,
                to: Some(caller),
                value: TOTAL_SUPPLY,
            });

            token
        }

        // =====================================================================
        // PSP22
        // =====================================================================

        #[ink(message)]
        pub fn total_supply(&self) -> Balance {
            self.total_supply
        }

        #[ink(message)]
        pub fn balance_of(&self, account: AccountId) -> Balance {
            self.balances.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance {
            self.allowances.get((owner, spender)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn transfer(&mut self, to: AccountId, value: Balance) -> Result<(), Error> {
            let from = self.env().caller();
            self.transfer_impl(from, to, value)
        }

        #[ink(message)]
        pub fn approve(&mut self, spender: AccountId, value: Balance) -> Result<(), Error> {
            let owner = self.env().caller();
            self.allowances.insert((owner, spender), &value);
            self.env().emit_event(Approval { owner, spender, value });
            Ok(())
        }

        /// Pull `value` from `from`, running the full taxed path.
        ///
        /// The allowance is only consumed once the transfer has applied.
        #[ink(message)]
        pub fn transfer_from(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
            let spender = self.env().caller();
            let current_allowance = self.allowance(from, spender);
            if current_allowance < value {
                return Err(Error::InsufficientAllowance);
            }
            self.transfer_impl(from, to, value)?;
            self.allowances
                .insert((from, spender), &(current_allowance - value));
            Ok(())
        }

        #[ink(message)]
        pub fn name(&self) -> String {
            self.name.clone()
        }

        #[ink(message)]
        pub fn symbol(&self) -> String {
            self.symbol.clone()
        }

        #[ink(message)]
        pub fn decimals(&self) -> u8 {
            DECIMALS
        }

        // =====================================================================
        // REFLECTION
        // =====================================================================

        /// Balance including accrued reflection.
        ///
        /// Excluded accounts, and any read against a degenerate denominator,
        /// report the raw balance.
        #[ink(message)]
        pub fn reflected_balance_of(&self, account: AccountId) -> Balance {
            let raw = self.balance_of(account);
            if self.is_excluded(account) {
                return raw;
            }
            let snapshot = self.snapshots.get(account).unwrap_or(0);
            reflection::reflected_value(snapshot, self.total_supply, self.reflection_total)
                .unwrap_or(raw)
        }

        #[ink(message)]
        pub fn reflection_total(&self) -> Balance {
            self.reflection_total
        }

        #[ink(message)]
        pub fn is_excluded(&self, account: AccountId) -> bool {
            self.excluded.contains(account)
        }

        /// Freeze `account` at its raw balance.
        ///
        /// Reflection accrued so far is parked and handed back on inclusion.
        #[ink(message)]
        pub fn exclude_from_reflection(&mut self, account: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.freeze(account)
        }

        /// Return `account` to the reflected set.
        ///
        /// The snapshot is rebuilt from the raw balance plus the reflection
        /// parked at exclusion, at the current denominator. Reflection that
        /// happened while excluded is neither awarded nor clawed back.
        #[ink(message)]
        pub fn include_in_reflection(&mut self, account: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            let Some(parked) = self.excluded.get(account) else {
                return Ok(());
            };
            let restored = self
                .balance_of(account)
                .checked_add(parked)
                .ok_or(Error::Overflow)?;
            let snapshot =
                reflection::snapshot_of(restored, self.reflection_total, self.total_supply)?;
            self.excluded.remove(account);
            self.snapshots.insert(account, &snapshot);
            self.env().emit_event(ReflectionExclusionChanged {
                account,
                excluded: false,
            });
            Ok(())
        }

        // =====================================================================
        // RATES
        // =====================================================================

        #[ink(message)]
        pub fn tax_rate(&self) -> u16 {
            self.rates.tax_bps
        }

        #[ink(message)]
        pub fn reflection_rate(&self) -> u16 {
            self.rates.reflection_bps
        }

        /// Owner or governance queue; `RangeError` above `MAX_TAX_BPS`.
        #[ink(message)]
        pub fn set_tax_rate(&mut self, bps: u16) -> Result<(), Error> {
            self.only_owner_or_governance()?;
            self.rates = self.rates.with_tax(bps)?;
            self.emit_rates();
            Ok(())
        }

        /// Owner or governance queue; `RangeError` above `MAX_REFLECTION_BPS`.
        #[ink(message)]
        pub fn set_reflection_rate(&mut self, bps: u16) -> Result<(), Error> {
            self.only_owner_or_governance()?;
            self.rates = self.rates.with_reflection(bps)?;
            self.emit_rates();
            Ok(())
        }

        // =====================================================================
        // ACCESS GUARD
        // =====================================================================

        #[ink(message)]
        pub fn pause(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            self.switches.paused = true;
            self.emit_switches();
            Ok(())
        }

        #[ink(message)]
        pub fn unpause(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            self.switches.paused = false;
            self.emit_switches();
            Ok(())
        }

        /// Owner or emergency admin.
        #[ink(message)]
        pub fn activate_circuit_breaker(&mut self) -> Result<(), Error> {
            let caller = self.env().caller();
            if caller != self.config.owner && Some(caller) != self.config.emergency_admin {
                return Err(Error::AccessDenied);
            }
            self.switches.circuit_breaker = true;
            self.emit_switches();
            Ok(())
        }

        /// Owner only.  Clears the pause flag as well.
        #[ink(message)]
        pub fn deactivate_circuit_breaker(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            self.switches.reset();
            self.emit_switches();
            Ok(())
        }

        #[ink(message)]
        pub fn is_paused(&self) -> bool {
            self.switches.paused
        }

        #[ink(message)]
        pub fn is_circuit_breaker_active(&self) -> bool {
            self.switches.circuit_breaker
        }

        #[ink(message)]
        pub fn blacklist(&mut self, account: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.blacklisted.insert(account, &());
            self.env().emit_event(BlacklistUpdated {
                account,
                blacklisted: true,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn unblacklist(&mut self, account: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.blacklisted.remove(account);
            self.env().emit_event(BlacklistUpdated {
                account,
                blacklisted: false,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn is_blacklisted(&self, account: AccountId) -> bool {
            self.blacklisted.contains(account)
        }

        // =====================================================================
        // ADMIN
        // =====================================================================

        #[ink(message)]
        pub fn config(&self) -> TokenConfig {
            self.config
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.config.owner = new_owner;
            self.emit_config();
            Ok(())
        }

        #[ink(message)]
        pub fn set_emergency_admin(&mut self, admin: Option<AccountId>) -> Result<(), Error> {
            self.only_owner()?;
            self.config.emergency_admin = admin;
            self.emit_config();
            Ok(())
        }

        /// Register the governance delay queue allowed to change rates.
        #[ink(message)]
        pub fn set_governance(&mut self, governance: Option<AccountId>) -> Result<(), Error> {
            self.only_owner()?;
            self.config.governance = governance;
            self.emit_config();
            Ok(())
        }

        /// New treasury is excluded from reflection; the old one stays excluded.
        #[ink(message)]
        pub fn set_treasury(&mut self, treasury: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.config.treasury = treasury;
            self.freeze(treasury)?;
            self.emit_config();
            Ok(())
        }

        /// New vault is excluded from reflection; the old one stays excluded.
        #[ink(message)]
        pub fn set_prize_vault(&mut self, prize_vault: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.config.prize_vault = prize_vault;
            self.freeze(prize_vault)?;
            self.emit_config();
            Ok(())
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn transfer_impl(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
            self.ensure_can_move(from, to)?;

            let from_balance = self.balance_of(from);
            if from_balance < value {
                return Err(Error::InsufficientBalance);
            }

            let split = if to == AccountId::from(BURN_SINK) {
                TaxSplit::untaxed(value)
            } else {
                self.rates.split(value)?
            };

            let shrunk_total = reflection::shrink_reflection_total(
                self.reflection_total,
                split.reflection,
                self.total_supply,
            )?;

            // ── Effects: nothing below can fail for in-range balances ─────
            self.debit(from, value)?;
            self.reflection_total = shrunk_total;
            self.credit(to, split.net)?;
            self.credit(self.config.treasury, split.treasury)?;
            self.credit(self.config.prize_vault, split.vault)?;
            self.credit(self.env().account_id(), split.reflection)?;

            for (leg, value) in [
                (to, split.net),
                (self.config.treasury, split.treasury),
                (self.config.prize_vault, split.vault),
                (self.env().account_id(), split.reflection),
            ] {
                if value > 0 || leg == to {
                    self.env().emit_event(Transfer {
                        from: Some(from),
                        to: Some(leg),
                        value,
                    });
                }
            }

            if split.tax() > 0 {
                self.env().emit_event(TaxDistributed {
                    from,
                    treasury_share: split.treasury,
                    vault_share: split.vault,
                });
            }
            if split.reflection > 0 {
                self.env().emit_event(Reflected {
                    from,
                    amount: split.reflection,
                    reflection_total: self.reflection_total,
                });
            }

            Ok(())
        }

        /// Breaker → pause → sender → recipient.
        fn ensure_can_move(&self, from: AccountId, to: AccountId) -> Result<(), Error> {
            self.switches.ensure_open()?;
            if self.is_blacklisted(from) || self.is_blacklisted(to) {
                return Err(Error::AccessDenied);
            }
            Ok(())
        }

        fn debit(&mut self, account: AccountId, amount: Balance) -> Result<(), Error> {
            let balance = self.balance_of(account);
            let remaining = balance.checked_sub(amount).ok_or(Error::InsufficientBalance)?;
            match self.excluded.get(account) {
                // Parked reflection leaves with the raw units, as a snapshot would.
                Some(parked) => {
                    let kept = reflection::debit_snapshot(parked, balance, amount)?;
                    self.excluded.insert(account, &kept);
                }
                None => {
                    let snapshot = self.snapshots.get(account).unwrap_or(0);
                    let kept = reflection::debit_snapshot(snapshot, balance, amount)?;
                    self.snapshots.insert(account, &kept);
                }
            }
            self.balances.insert(account, &remaining);
            Ok(())
        }

        fn credit(&mut self, account: AccountId, amount: Balance) -> Result<(), Error> {
            if amount == 0 {
                return Ok(());
            }
            let balance = self.balance_of(account);
            let updated = balance.checked_add(amount).ok_or(Error::Overflow)?;
            if !self.is_excluded(account) {
                let snapshot = self.snapshots.get(account).unwrap_or(0);
                let added = reflection::snapshot_of(amount, self.reflection_total, self.total_supply)?;
                let snapshot = snapshot.checked_add(added).ok_or(Error::Overflow)?;
                self.snapshots.insert(account, &snapshot);
            }
            self.balances.insert(account, &updated);
            Ok(())
        }

        /// Exclude `account`, parking `reflected − raw`. No-op if already excluded.
        fn freeze(&mut self, account: AccountId) -> Result<(), Error> {
            if self.is_excluded(account) {
                return Ok(());
            }
            let accrued = self
                .reflected_balance_of(account)
                .saturating_sub(self.balance_of(account));
            self.excluded.insert(account, &accrued);
            self.snapshots.remove(account);
            self.env().emit_event(ReflectionExclusionChanged {
                account,
                excluded: true,
            });
            Ok(())
        }

        fn only_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.config.owner {
                return Err(Error::AccessDenied);
            }
            Ok(())
        }

        fn only_owner_or_governance(&self) -> Result<(), Error> {
            let caller = self.env().caller();
            if caller != self.config.owner && Some(caller) != self.config.governance {
                return Err(Error::AccessDenied);
            }
            Ok(())
        }

        fn emit_rates(&self) {
            self.env().emit_event(RatesUpdated {
                by: self.env().caller(),
                tax_bps: self.rates.tax_bps,
                reflection_bps: self.rates.reflection_bps,
            });
        }

        fn emit_switches(&self) {
            self.env().emit_event(SwitchesChanged {
                by: self.env().caller(),
                paused: self.switches.paused,
                circuit_breaker: self.switches.circuit_breaker,
            });
        }

        fn emit_config(&self) {
            self.env().emit_event(ConfigUpdated {
                by: self.env().caller(),
                config: self.config,
            });
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
