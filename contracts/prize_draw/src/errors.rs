/// Errors surfaced by the draw engine.
#[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    /// Operation not valid in the current lottery state.
    StateError,
    /// Caller is not the owner, or not the oracle on fulfillment.
    AccessDenied,
    /// Config parameter or randomness payload out of bounds.
    RangeError,
    /// Entrant holds less than `MIN_HOLDING`.
    EligibilityError,
    DuplicateEntry,
    NoParticipants,
    /// Prize vault too empty to fund a pool.
    InsufficientFunds,
    /// Vault has not approved the engine for the full pool.
    AllowanceError,
    /// Not a permitted draw day.
    ScheduleError,
    /// Callback for an unknown, consumed or abandoned request.
    RequestMismatch,
    /// The oracle rejected or failed the randomness request.
    OracleCallFailed,
    Overflow,
    /// Payout rejected by the token ledger.
    Ledger(reflection_token::Error),
}
