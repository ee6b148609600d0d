#![cfg_attr(not(feature = "std"), no_std, no_main)]

mod errors;
pub mod oracle;
pub mod schedule;

pub use errors::Error;
pub use oracle::{RandomWord, RandomnessOracle, RequestId, VrfConfig, VrfCoordinator};

pub use self::prize_draw::{DrawEngine, DrawEngineRef};

pub type Balance = u128;

pub mod constants {
    use super::Balance;
    use reflection_token::constants::ONE_TOKEN;

    /// Minimum raw balance needed to enter a draw.
    pub const MIN_HOLDING: Balance = 777 * ONE_TOKEN;

    /// Entrants per draw; keeps `participants` within one storage cell.
    pub const MAX_PARTICIPANTS: usize = 256;

    /// Share of the vault balance offered per draw, in percent.
    pub const PRIZE_SHARE_PERCENT: Balance = 25;

    /// Hard cap on a single prize.
    pub const MAX_PRIZE: Balance = 7_000_000 * ONE_TOKEN;

    pub const DRAW_DAYS: [u32; 3] = [7, 17, 27];

    pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
    pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 200_000;
    pub const DEFAULT_NUM_WORDS: u32 = 1;
}

/// `min(vault × 25%, MAX_PRIZE)`.
pub fn prize_pool_for(vault_balance: Balance) -> Result<Balance, Error> {
    let share = vault_balance
        .checked_mul(constants::PRIZE_SHARE_PERCENT)
        .ok_or(Error::Overflow)?
        / 100;
    Ok(share.min(constants::MAX_PRIZE))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub enum LotteryState {
    #[default]
    Closed,
    Open,
    Drawing,
}

/// # Lucky Seven — Prize Draw Engine
///
/// **Role:** Scheduled lottery over token holders.  Sizes the prize from
/// the prize vault, asks the VRF coordinator for randomness and pays the
/// winner by pulling from the vault through the taxed ledger path.
///
/// ## State machine
///
/// ```text
///            open_lottery              close_lottery
///   CLOSED ───────────────► OPEN ─────────────────► CLOSED
///     ▲                     (enter_lottery)            │ start_draw
///     │  fulfill_random_words / emergency_cancel       ▼ (7th·17th·27th)
///     └─────────────────────────────────────────── DRAWING
/// ```
///
/// A request id maps to the draw it was issued for; any callback that does
/// not map to the live draw is rejected with `RequestMismatch`, so a late
/// answer to an abandoned draw can never pay out.
#[ink::contract]
pub mod prize_draw {
    use crate::constants::{MAX_PARTICIPANTS, MIN_HOLDING};
    use crate::oracle::{pick_index, RandomWord, RandomnessOracle, RequestId, VrfConfig, VrfCoordinator};
    use crate::{prize_pool_for, schedule, Error, LotteryState};
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;
    use reflection_token::{token_at, TokenLedger};
    use ink::codegen::Env;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct DrawEngine {
        // ── Wiring ────────────────────────────────────────────────────────
        owner: AccountId,
        token: AccountId,
        prize_vault: AccountId,
        oracle: AccountId,
        vrf: VrfConfig,

        // ── Live draw ─────────────────────────────────────────────────────
        state: LotteryState,
        /// Id of the most recently started draw; 0 before the first.
        draw_id: u32,
        /// Insertion-ordered, duplicate-free.
        participants: Vec<AccountId>,
        prize_pool: Balance,
        /// Oracle request of the draw in flight.
        live_request: Option<RequestId>,

        // ── History ───────────────────────────────────────────────────────
        pending: Mapping<RequestId, u32>,
        winners: Mapping<u32, AccountId>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct LotteryOpened {
        #[ink(topic)]
        draw_id: u32,
    }

    #[ink(event)]
    pub struct LotteryClosed {
        #[ink(topic)]
        draw_id: u32,
        participant_count: u32,
    }

    #[ink(event)]
    pub struct ParticipantAdded {
        #[ink(topic)]
        draw_id: u32,
        #[ink(topic)]
        participant: AccountId,
    }

    #[ink(event)]
    pub struct DrawStarted {
        #[ink(topic)]
        draw_id: u32,
        request_id: RequestId,
        prize_pool: Balance,
        participant_count: u32,
    }

    #[ink(event)]
    pub struct DrawCompleted {
        #[ink(topic)]
        draw_id: u32,
        #[ink(topic)]
        winner: AccountId,
        prize: Balance,
    }

    /// Draw ended without a payout.
    #[ink(event)]
    pub struct DrawCancelled {
        #[ink(topic)]
        draw_id: u32,
        by: AccountId,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl DrawEngine {
        #[ink(constructor)]
        pub fn new(token: AccountId, prize_vault: AccountId, oracle: AccountId, vrf: VrfConfig) -> Self {
            Self {
                owner: Self::env().caller(),
                token,
                prize_vault,
                oracle,
                vrf,
                state: LotteryState::Closed,
                draw_id: 0,
                participants: Vec::new(),
                prize_pool: 0,
                live_request: None,
                pending: Mapping::default(),
                winners: Mapping::default(),
            }
        }

        // =====================================================================
        // LIFECYCLE
        // =====================================================================

        /// Owner: CLOSED → OPEN with an empty participant set.
        #[ink(message)]
        pub fn open_lottery(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            if self.state != LotteryState::Closed {
                return Err(Error::StateError);
            }
            self.participants.clear();
            self.state = LotteryState::Open;
            self.env().emit_event(LotteryOpened {
                draw_id: self.upcoming_draw_id(),
            });
            Ok(())
        }

        /// Owner: OPEN → CLOSED, freezing the entrants for `start_draw`.
        #[ink(message)]
        pub fn close_lottery(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            if self.state != LotteryState::Open {
                return Err(Error::StateError);
            }
            self.state = LotteryState::Closed;
            self.env().emit_event(LotteryClosed {
                draw_id: self.upcoming_draw_id(),
                participant_count: self.participant_count(),
            });
            Ok(())
        }

        #[ink(message)]
        pub fn enter_lottery(&mut self) -> Result<(), Error> {
            let ledger = token_at(self.token);
            self.enter_with(&ledger)
        }

        /// Anyone, on a draw day. Returns the oracle request id.
        #[ink(message)]
        pub fn start_draw(&mut self) -> Result<RequestId, Error> {
            let ledger = token_at(self.token);
            let mut oracle = VrfCoordinator::at(self.oracle);
            self.start_draw_with(&ledger, &mut oracle)
        }

        /// Oracle callback.
        #[ink(message)]
        pub fn fulfill_random_words(&mut self, request_id: RequestId, random_words: Vec<RandomWord>) -> Result<(), Error> {
            let mut ledger = token_at(self.token);
            self.fulfill_with(&mut ledger, request_id, random_words)
        }

        /// Owner: abandon the in-flight draw without payout.
        ///
        /// The oracle request is forgotten: `pending_draw_of` no longer maps
        /// it and its late callback fails the state or request check.
        #[ink(message)]
        pub fn emergency_cancel(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            if self.state != LotteryState::Drawing {
                return Err(Error::StateError);
            }
            if let Some(request_id) = self.live_request.take() {
                self.pending.remove(request_id);
            }
            self.participants.clear();
            self.state = LotteryState::Closed;
            self.env().emit_event(DrawCancelled {
                draw_id: self.draw_id,
                by: self.env().caller(),
            });
            Ok(())
        }

        // =====================================================================
        // VIEWS
        // =====================================================================

        #[ink(message)]
        pub fn state(&self) -> LotteryState {
            self.state
        }

        #[ink(message)]
        pub fn current_draw_id(&self) -> u32 {
            self.draw_id
        }

        #[ink(message)]
        pub fn participants(&self) -> Vec<AccountId> {
            self.participants.clone()
        }

        #[ink(message)]
        pub fn participant_count(&self) -> u32 {
            u32::try_from(self.participants.len()).unwrap_or(u32::MAX)
        }

        #[ink(message)]
        pub fn prize_pool(&self) -> Balance {
            self.prize_pool
        }

        #[ink(message)]
        pub fn winner_of(&self, draw_id: u32) -> Option<AccountId> {
            self.winners.get(draw_id)
        }

        /// Draw a still-unconsumed request belongs to.
        #[ink(message)]
        pub fn pending_draw_of(&self, request_id: RequestId) -> Option<u32> {
            self.pending.get(request_id)
        }

        #[ink(message)]
        pub fn vrf_config(&self) -> VrfConfig {
            self.vrf
        }

        /// Next permitted day of month, counting today.
        #[ink(message)]
        pub fn next_draw_day(&self) -> Option<u32> {
            schedule::next_draw_day(self.env().block_timestamp())
        }

        // =====================================================================
        // ADMIN
        // =====================================================================

        #[ink(message)]
        pub fn set_vrf_config(&mut self, vrf: VrfConfig) -> Result<(), Error> {
            self.only_owner()?;
            vrf.validate()?;
            self.vrf = vrf;
            Ok(())
        }

        /// Not while a draw is in flight: the pending callback would come
        /// from the old coordinator.
        #[ink(message)]
        pub fn set_oracle(&mut self, oracle: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            if self.state == LotteryState::Drawing {
                return Err(Error::StateError);
            }
            self.oracle = oracle;
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            self.owner = new_owner;
            Ok(())
        }
    }

    impl DrawEngine {
        // =====================================================================
        // ENGINE (ledger / oracle injected)
        // =====================================================================

        fn enter_with<L: TokenLedger>(&mut self, ledger: &L) -> Result<(), Error> {
            if self.state != LotteryState::Open {
                return Err(Error::StateError);
            }
            let caller = self.env().caller();
            if ledger.balance_of(caller) < MIN_HOLDING {
                return Err(Error::EligibilityError);
            }
            if self.participants.contains(&caller) {
                return Err(Error::DuplicateEntry);
            }
            if self.participants.len() >= MAX_PARTICIPANTS {
                return Err(Error::StateError);
            }
            self.participants.push(caller);
            self.env().emit_event(ParticipantAdded {
                draw_id: self.upcoming_draw_id(),
                participant: caller,
            });
            Ok(())
        }

        fn start_draw_with<L: TokenLedger, O: RandomnessOracle>(
            &mut self,
            ledger: &L,
            oracle: &mut O,
        ) -> Result<RequestId, Error> {
            if self.state != LotteryState::Closed {
                return Err(Error::StateError);
            }
            if !schedule::is_draw_day(self.env().block_timestamp()) {
                return Err(Error::ScheduleError);
            }
            if self.participants.is_empty() {
                return Err(Error::NoParticipants);
            }

            let pool = prize_pool_for(ledger.balance_of(self.prize_vault))?;
            if pool == 0 {
                return Err(Error::InsufficientFunds);
            }
            if ledger.allowance(self.prize_vault, self.env().account_id()) < pool {
                return Err(Error::AllowanceError);
            }

            let draw_id = self.draw_id.checked_add(1).ok_or(Error::Overflow)?;
            let request_id = oracle.request_random_words(&self.vrf)?;
            if self.pending.contains(request_id) {
                return Err(Error::RequestMismatch);
            }

            self.draw_id = draw_id;
            self.prize_pool = pool;
            self.pending.insert(request_id, &draw_id);
            self.live_request = Some(request_id);
            self.state = LotteryState::Drawing;

            self.env().emit_event(DrawStarted {
                draw_id,
                request_id,
                prize_pool: pool,
                participant_count: self.participant_count(),
            });
            Ok(request_id)
        }

        fn fulfill_with<L: TokenLedger>(
            &mut self,
            ledger: &mut L,
            request_id: RequestId,
            random_words: Vec<RandomWord>,
        ) -> Result<(), Error> {
            if self.env().caller() != self.oracle {
                return Err(Error::AccessDenied);
            }
            if self.state != LotteryState::Drawing {
                ink::env::debug_println!("fulfillment {} ignored: no draw in flight", request_id);
                return Err(Error::StateError);
            }
            match self.pending.get(request_id) {
                Some(id) if id == self.draw_id => {}
                other => {
                    ink::env::debug_println!(
                        "fulfillment {} ignored: maps to {:?}, live draw {}",
                        request_id,
                        other,
                        self.draw_id
                    );
                    return Err(Error::RequestMismatch);
                }
            }

            let draw_id = self.draw_id;

            if self.participants.is_empty() {
                self.pending.remove(request_id);
                self.live_request = None;
                self.state = LotteryState::Closed;
                self.env().emit_event(DrawCancelled {
                    draw_id,
                    by: self.env().caller(),
                });
                return Ok(());
            }

            let word = random_words.first().ok_or(Error::RangeError)?;
            let winner = pick_index(word, self.participants.len())
                .and_then(|i| self.participants.get(i).copied())
                .ok_or(Error::NoParticipants)?;

            let prize = self.prize_pool;
            ledger
                .transfer_from(self.prize_vault, winner, prize)
                .map_err(Error::Ledger)?;

            self.pending.remove(request_id);
            self.live_request = None;
            self.winners.insert(draw_id, &winner);
            self.participants.clear();
            self.state = LotteryState::Closed;

            self.env().emit_event(DrawCompleted { draw_id, winner, prize });
            Ok(())
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn upcoming_draw_id(&self) -> u32 {
            self.draw_id.saturating_add(1)
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
