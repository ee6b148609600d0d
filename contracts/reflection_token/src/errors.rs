/// Errors surfaced by the token ledger.
///
/// Every variant aborts the whole message; nothing is written before the
/// failing check.
#[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    /// Caller lacks the role required for this message, an endpoint is
    /// blacklisted, or the ledger is paused / circuit-broken.
    AccessDenied,
    /// A rate was set above its ceiling.
    RangeError,
    /// Sender's raw balance is insufficient.
    InsufficientBalance,
    /// Spender's allowance is insufficient.
    InsufficientAllowance,
    /// An arithmetic operation overflowed.
    Overflow,
}
