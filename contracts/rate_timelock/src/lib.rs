#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub use self::rate_timelock::{RateChange, RateTimelock, RateTimelockRef};

/// # Lucky Seven — Rate Timelock
///
/// **Role:** Governance actor for the token's tax and reflection rates.
/// Every change is scheduled first and can only be executed once the delay
/// has elapsed, giving holders time to react.
///
/// ```text
///   proposer ──schedule(op, salt)──► queue[blake2(op, salt)] = now + delay
///   anyone   ──execute(op, salt)───► (now ≥ ready_at) ─► token.set_*_rate
///   proposer ──cancel(op, salt)────► entry removed
/// ```
///
/// The token must name this contract as its governance account.
#[ink::contract]
pub mod rate_timelock {
    use ink::env::hash::{Blake2x256, HashOutput};
    use ink::storage::Mapping;
    use reflection_token::constants::{MAX_REFLECTION_BPS, MAX_TAX_BPS};
    use reflection_token::{token_at, RateControl};

    // =========================================================================
    // CONSTANTS
    // =========================================================================

    /// Shortest delay the queue can be deployed with: 2 days.
    pub const MIN_DELAY_MS: u64 = 2 * 24 * 60 * 60 * 1_000;

    pub type Fingerprint = [u8; 32];

    // =========================================================================
    // TYPES
    // =========================================================================

    /// A queued rate change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum RateChange {
        Tax(u16),
        Reflection(u16),
    }

    impl RateChange {
        fn validate(&self) -> Result<(), Error> {
            let in_range = match *self {
                RateChange::Tax(bps) => bps <= MAX_TAX_BPS,
                RateChange::Reflection(bps) => bps <= MAX_REFLECTION_BPS,
            };
            if !in_range {
                return Err(Error::RangeError);
            }
            Ok(())
        }
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct RateTimelock {
        proposer: AccountId,
        token: AccountId,
        delay: u64,
        /// Fingerprint → earliest execution timestamp.
        queue: Mapping<Fingerprint, Timestamp>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Scheduled {
        #[ink(topic)]
        id: Fingerprint,
        op: RateChange,
        ready_at: Timestamp,
    }

    #[ink(event)]
    pub struct Executed {
        #[ink(topic)]
        id: Fingerprint,
        op: RateChange,
    }

    #[ink(event)]
    pub struct Cancelled {
        #[ink(topic)]
        id: Fingerprint,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        AccessDenied,
        /// Delay below `MIN_DELAY_MS`, or a rate above its ceiling.
        RangeError,
        AlreadyScheduled,
        NotScheduled,
        /// Delay has not elapsed yet.
        ScheduleError,
        Overflow,
        /// Token rejected the rate change.
        Ledger(reflection_token::Error),
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl RateTimelock {
        /// The deployer becomes the proposer.
        #[ink(constructor)]
        pub fn new(token: AccountId, delay: u64) -> Result<Self, Error> {
            if delay < MIN_DELAY_MS {
                return Err(Error::RangeError);
            }
            Ok(Self {
                proposer: Self::env().caller(),
                token,
                delay,
                queue: Mapping::default(),
            })
        }

        #[ink(message)]
        pub fn schedule(&mut self, op: RateChange, salt: [u8; 32]) -> Result<Fingerprint, Error> {
            self.only_proposer()?;
            op.validate()?;
            let id = Self::fingerprint(&op, &salt);
            if self.queue.contains(id) {
                return Err(Error::AlreadyScheduled);
            }
            let ready_at = self
                .env()
                .block_timestamp()
                .checked_add(self.delay)
                .ok_or(Error::Overflow)?;
            self.queue.insert(id, &ready_at);
            self.env().emit_event(Scheduled { id, op, ready_at });
            Ok(id)
        }

        /// Anyone, once the delay has passed.
        #[ink(message)]
        pub fn execute(&mut self, op: RateChange, salt: [u8; 32]) -> Result<(), Error> {
            let mut token = token_at(self.token);
            self.execute_with(&mut token, op, salt)
        }

        #[ink(message)]
        pub fn cancel(&mut self, op: RateChange, salt: [u8; 32]) -> Result<(), Error> {
            self.only_proposer()?;
            let id = Self::fingerprint(&op, &salt);
            if self.queue.take(id).is_none() {
                return Err(Error::NotScheduled);
            }
            self.env().emit_event(Cancelled { id });
            Ok(())
        }

        #[ink(message)]
        pub fn ready_at(&self, id: Fingerprint) -> Option<Timestamp> {
            self.queue.get(id)
        }

        #[ink(message)]
        pub fn hash_operation(&self, op: RateChange, salt: [u8; 32]) -> Fingerprint {
            Self::fingerprint(&op, &salt)
        }

        #[ink(message)]
        pub fn delay(&self) -> u64 {
            self.delay
        }

        #[ink(message)]
        pub fn proposer(&self) -> AccountId {
            self.proposer
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn execute_with<R: RateControl>(&mut self, rates: &mut R, op: RateChange, salt: [u8; 32]) -> Result<(), Error> {
            let id = Self::fingerprint(&op, &salt);
            let ready_at = self.queue.get(id).ok_or(Error::NotScheduled)?;
            if self.env().block_timestamp() < ready_at {
                return Err(Error::ScheduleError);
            }

            // Consumed before the outgoing call.
            self.queue.remove(id);
            let applied = match op {
                RateChange::Tax(bps) => rates.set_tax_rate(bps),
                RateChange::Reflection(bps) => rates.set_reflection_rate(bps),
            };
            applied.map_err(Error::Ledger)?;

            self.env().emit_event(Executed { id, op });
            Ok(())
        }

        fn fingerprint(op: &RateChange, salt: &[u8; 32]) -> Fingerprint {
            let mut out = <Blake2x256 as HashOutput>::Type::default();
            ink::env::hash_encoded::<Blake2x256, _>(&(op, salt), &mut out);
            out
        }

        fn only_proposer(&self) -> Result<(), Error> {
            if self.env().caller() != self.proposer {
                return Err(Error::AccessDenied);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

    #[cfg(test)]
    mod tests {
        use super::*;
        use ink::env::{test, DefaultEnvironment};

        type Env = DefaultEnvironment;

        const T0: u64 = 1_700_000_000_000;
        const SALT: [u8; 32] = [0x11; 32];

        #[derive(Default)]
        struct MockRates {
            tax: u16,
            reflection: u16,
            reject: bool,
        }

        impl RateControl for MockRates {
            fn set_tax_rate(&mut self, bps: u16) -> Result<(), reflection_token::Error> {
                if self.reject {
                    return Err(reflection_token::Error::AccessDenied);
                }
                self.tax = bps;
                Ok(())
            }

            fn set_reflection_rate(&mut self, bps: u16) -> Result<(), reflection_token::Error> {
                if self.reject {
                    return Err(reflection_token::Error::AccessDenied);
                }
                self.reflection = bps;
                Ok(())
            }
        }

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }

        fn set_time(ms: u64) {
            test::set_block_timestamp::<Env>(ms);
        }

        fn deploy() -> RateTimelock {
            let accs = accounts();
            test::set_caller::<Env>(accs.alice);
            set_time(T0);
            RateTimelock::new(accs.django, MIN_DELAY_MS).unwrap()
        }

        #[ink::test]
        fn delay_below_minimum_rejected() {
            assert_eq!(
                RateTimelock::new(accounts().django, MIN_DELAY_MS - 1).err(),
                Some(Error::RangeError)
            );
        }

        #[ink::test]
        fn schedule_records_ready_time() {
            let mut q = deploy();
            let id = q.schedule(RateChange::Tax(150), SALT).unwrap();
            assert_eq!(q.ready_at(id), Some(T0 + MIN_DELAY_MS));
            assert_eq!(id, q.hash_operation(RateChange::Tax(150), SALT));
        }

        #[ink::test]
        fn fingerprint_covers_op_and_salt() {
            let q = deploy();
            let a = q.hash_operation(RateChange::Tax(150), SALT);
            assert_ne!(a, q.hash_operation(RateChange::Tax(151), SALT));
            assert_ne!(a, q.hash_operation(RateChange::Reflection(150), SALT));
            assert_ne!(a, q.hash_operation(RateChange::Tax(150), [0x22; 32]));
        }

        #[ink::test]
        fn schedule_is_proposer_only() {
            let mut q = deploy();
            test::set_caller::<Env>(accounts().bob);
            assert_eq!(q.schedule(RateChange::Tax(100), SALT), Err(Error::AccessDenied));
        }

        #[ink::test]
        fn duplicate_schedule_rejected() {
            let mut q = deploy();
            q.schedule(RateChange::Tax(100), SALT).unwrap();
            assert_eq!(
                q.schedule(RateChange::Tax(100), SALT),
                Err(Error::AlreadyScheduled)
            );
        }

        #[ink::test]
        fn out_of_range_rate_never_queued() {
            let mut q = deploy();
            assert_eq!(q.schedule(RateChange::Tax(301), SALT), Err(Error::RangeError));
            assert_eq!(
                q.schedule(RateChange::Reflection(101), SALT),
                Err(Error::RangeError)
            );
        }

        #[ink::test]
        fn execute_waits_for_delay() {
            let mut q = deploy();
            let mut rates = MockRates::default();
            q.schedule(RateChange::Reflection(80), SALT).unwrap();

            set_time(T0 + MIN_DELAY_MS - 1);
            assert_eq!(
                q.execute_with(&mut rates, RateChange::Reflection(80), SALT),
                Err(Error::ScheduleError)
            );
            assert_eq!(rates.reflection, 0);

            set_time(T0 + MIN_DELAY_MS);
            test::set_caller::<Env>(accounts().eve);
            q.execute_with(&mut rates, RateChange::Reflection(80), SALT).unwrap();
            assert_eq!(rates.reflection, 80);
        }

        #[ink::test]
        fn executed_operation_is_consumed() {
            let mut q = deploy();
            let mut rates = MockRates::default();
            let id = q.schedule(RateChange::Tax(250), SALT).unwrap();
            set_time(T0 + MIN_DELAY_MS);
            q.execute_with(&mut rates, RateChange::Tax(250), SALT).unwrap();
            assert_eq!(q.ready_at(id), None);
            assert_eq!(
                q.execute_with(&mut rates, RateChange::Tax(250), SALT),
                Err(Error::NotScheduled)
            );
        }

        #[ink::test]
        fn cancelled_operation_cannot_execute() {
            let mut q = deploy();
            let mut rates = MockRates::default();
            q.schedule(RateChange::Tax(250), SALT).unwrap();
            q.cancel(RateChange::Tax(250), SALT).unwrap();
            set_time(T0 + MIN_DELAY_MS);
            assert_eq!(
                q.execute_with(&mut rates, RateChange::Tax(250), SALT),
                Err(Error::NotScheduled)
            );
            assert_eq!(q.cancel(RateChange::Tax(250), SALT), Err(Error::NotScheduled));
        }

        #[ink::test]
        fn token_rejection_surfaces() {
            let mut q = deploy();
            let mut rates = MockRates {
                reject: true,
                ..Default::default()
            };
            q.schedule(RateChange::Tax(250), SALT).unwrap();
            set_time(T0 + MIN_DELAY_MS);
            assert_eq!(
                q.execute_with(&mut rates, RateChange::Tax(250), SALT),
                Err(Error::Ledger(reflection_token::Error::AccessDenied))
            );
        }
    }
}
