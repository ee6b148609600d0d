//! Tax and reflection accounting.
//!
//! Raw balances carry the supply invariant; reflection is tracked as a
//! per-holder snapshot in "reflection units" against a shrinking global
//! `reflection_total`. A holder's reported balance is
//! `snapshot * total_supply / reflection_total`, so every shrink of the
//! denominator lifts all non-excluded holders at once without touching a
//! single raw balance.
//!
//! ```text
//! amount ─┬─ tax        = amount × tax_bps / 10 000
//!         │    ├─ treasury = ⌊tax / 2⌋
//!         │    └─ vault    = tax − ⌊tax / 2⌋
//!         ├─ reflection = amount × reflection_bps / 10 000  → reserve account
//!         └─ net        = amount − tax − reflection         → recipient
//!
//! reflection_total −= reflection_total × reflection / total_supply
//! ```

use primitive_types::U256;

use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_REFLECTION_BPS, DEFAULT_TAX_BPS, MAX_REFLECTION_BPS, MAX_TAX_BPS,
};
use crate::{Balance, Error};

/// Live tax and reflection rates, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct Rates {
    pub tax_bps: u16,
    pub reflection_bps: u16,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            tax_bps: DEFAULT_TAX_BPS,
            reflection_bps: DEFAULT_REFLECTION_BPS,
        }
    }
}

impl Rates {
    pub fn with_tax(self, tax_bps: u16) -> Result<Self, Error> {
        if tax_bps > MAX_TAX_BPS {
            return Err(Error::RangeError);
        }
        Ok(Self { tax_bps, ..self })
    }

    pub fn with_reflection(self, reflection_bps: u16) -> Result<Self, Error> {
        if reflection_bps > MAX_REFLECTION_BPS {
            return Err(Error::RangeError);
        }
        Ok(Self {
            reflection_bps,
            ..self
        })
    }

    /// Split a taxed transfer into its four legs.
    ///
    /// The legs always sum to `amount`; the odd unit of an odd tax goes to
    /// the vault.
    pub fn split(&self, amount: Balance) -> Result<TaxSplit, Error> {
        let tax = bps_of(amount, self.tax_bps)?;
        let reflection = bps_of(amount, self.reflection_bps)?;
        let net = amount
            .checked_sub(tax)
            .and_then(|r| r.checked_sub(reflection))
            .ok_or(Error::Overflow)?;
        let treasury = tax / 2;
        Ok(TaxSplit {
            net,
            treasury,
            vault: tax - treasury,
            reflection,
        })
    }
}

/// The destinations of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSplit {
    pub net: Balance,
    pub treasury: Balance,
    pub vault: Balance,
    pub reflection: Balance,
}

impl TaxSplit {
    /// Mint and burn legs: everything reaches the recipient.
    pub fn untaxed(amount: Balance) -> Self {
        Self {
            net: amount,
            treasury: 0,
            vault: 0,
            reflection: 0,
        }
    }

    pub fn tax(&self) -> Balance {
        self.treasury + self.vault
    }
}

fn bps_of(amount: Balance, bps: u16) -> Result<Balance, Error> {
    amount
        .checked_mul(Balance::from(bps))
        .map(|v| v / BPS_DENOMINATOR)
        .ok_or(Error::Overflow)
}

/// `a * b / d` with a 256-bit intermediate.
fn mul_div(a: Balance, b: Balance, d: Balance, round_up: bool) -> Result<Balance, Error> {
    if d == 0 {
        return Err(Error::Overflow);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(Error::Overflow)?;
    let (mut quotient, remainder) = product.div_mod(U256::from(d));
    if round_up && !remainder.is_zero() {
        quotient = quotient.checked_add(U256::one()).ok_or(Error::Overflow)?;
    }
    if quotient > U256::from(Balance::MAX) {
        return Err(Error::Overflow);
    }
    Ok(quotient.low_u128())
}

/// Largest multiple of `supply` representable in a `Balance`.
pub fn initial_reflection_total(supply: Balance) -> Balance {
    if supply == 0 {
        return 0;
    }
    Balance::MAX - Balance::MAX % supply
}

/// Denominator after one reflection event of `reflection` raw units.
pub fn shrink_reflection_total(
    reflection_total: Balance,
    reflection: Balance,
    supply: Balance,
) -> Result<Balance, Error> {
    if reflection == 0 || reflection_total == 0 || supply == 0 {
        return Ok(reflection_total);
    }
    let cut = mul_div(reflection_total, reflection, supply, false)?;
    // Keep the denominator strictly positive.
    Ok(reflection_total.saturating_sub(cut).max(1))
}

/// Reflection units worth `raw` at the current denominator.
///
/// Rounded up so that reading the snapshot back yields exactly `raw`
/// whenever `reflection_total > supply`.
pub fn snapshot_of(raw: Balance, reflection_total: Balance, supply: Balance) -> Result<Balance, Error> {
    if supply == 0 {
        return Ok(0);
    }
    mul_div(raw, reflection_total, supply, true)
}

/// Shrink a snapshot in proportion to a raw debit.
///
/// Accrued reflection leaves with the raw units it was earned on; a holder
/// who empties the account keeps nothing.
pub fn debit_snapshot(snapshot: Balance, raw_before: Balance, amount: Balance) -> Result<Balance, Error> {
    if raw_before == 0 || amount >= raw_before {
        return Ok(0);
    }
    mul_div(snapshot, raw_before - amount, raw_before, false)
}

/// Reported balance of a snapshot, or `None` when the denominator is
/// degenerate.
pub fn reflected_value(snapshot: Balance, supply: Balance, reflection_total: Balance) -> Option<Balance> {
    if reflection_total == 0 || supply == 0 {
        return None;
    }
    mul_div(snapshot, supply, reflection_total, false).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ONE_TOKEN, TOTAL_SUPPLY};

    #[test]
    fn split_even_tax_halves() {
        let s = Rates::default().split(100).unwrap();
        assert_eq!(s.tax(), 2);
        assert_eq!((s.treasury, s.vault), (1, 1));
        assert_eq!(s.reflection, 0);
        assert_eq!(s.net, 98);
    }

    #[test]
    fn split_odd_tax_sends_remainder_to_vault() {
        // 150 × 200 / 10 000 = 3
        let s = Rates::default().split(150).unwrap();
        assert_eq!(s.tax(), 3);
        assert_eq!((s.treasury, s.vault), (1, 2));
    }

    #[test]
    fn split_legs_sum_to_amount() {
        let rates = Rates { tax_bps: 300, reflection_bps: 100 };
        for amount in [0u128, 1, 99, 10_001, 123_456_789, 7 * ONE_TOKEN + 3] {
            let s = rates.split(amount).unwrap();
            assert_eq!(s.net + s.treasury + s.vault + s.reflection, amount);
        }
    }

    #[test]
    fn split_thousand_tokens_default_rates() {
        let s = Rates::default().split(1_000 * ONE_TOKEN).unwrap();
        assert_eq!(s.net, 975 * ONE_TOKEN);
        assert_eq!(s.treasury, 10 * ONE_TOKEN);
        assert_eq!(s.vault, 10 * ONE_TOKEN);
        assert_eq!(s.reflection, 5 * ONE_TOKEN);
    }

    #[test]
    fn rate_ceilings_enforced() {
        let r = Rates::default();
        assert_eq!(r.with_tax(300).unwrap().tax_bps, 300);
        assert_eq!(r.with_tax(301), Err(Error::RangeError));
        assert_eq!(r.with_reflection(100).unwrap().reflection_bps, 100);
        assert_eq!(r.with_reflection(101), Err(Error::RangeError));
        assert_eq!(r.with_tax(0).unwrap().reflection_bps, r.reflection_bps);
    }

    #[test]
    fn initial_total_is_multiple_of_supply() {
        let r = initial_reflection_total(TOTAL_SUPPLY);
        assert_eq!(r % TOTAL_SUPPLY, 0);
        assert!(Balance::MAX - r < TOTAL_SUPPLY);
        assert_eq!(initial_reflection_total(0), 0);
    }

    #[test]
    fn shrink_strictly_decreases_on_positive_reflection() {
        let r0 = initial_reflection_total(TOTAL_SUPPLY);
        let r1 = shrink_reflection_total(r0, 1, TOTAL_SUPPLY).unwrap();
        assert!(r1 < r0);
        let r2 = shrink_reflection_total(r1, 5 * ONE_TOKEN, TOTAL_SUPPLY).unwrap();
        assert!(r2 < r1);
        assert_eq!(shrink_reflection_total(r2, 0, TOTAL_SUPPLY).unwrap(), r2);
    }

    #[test]
    fn snapshot_reads_back_exactly_after_shrinks() {
        let mut r = initial_reflection_total(TOTAL_SUPPLY);
        for _ in 0..5 {
            r = shrink_reflection_total(r, 3 * ONE_TOKEN + 7, TOTAL_SUPPLY).unwrap();
        }
        for raw in [1u128, 975 * ONE_TOKEN, TOTAL_SUPPLY / 3] {
            let snap = snapshot_of(raw, r, TOTAL_SUPPLY).unwrap();
            assert_eq!(reflected_value(snap, TOTAL_SUPPLY, r), Some(raw));
        }
    }

    #[test]
    fn reflected_value_grows_as_total_shrinks() {
        let r0 = initial_reflection_total(TOTAL_SUPPLY);
        let snap = snapshot_of(1_000 * ONE_TOKEN, r0, TOTAL_SUPPLY).unwrap();
        let r1 = shrink_reflection_total(r0, 5 * ONE_TOKEN, TOTAL_SUPPLY).unwrap();
        let before = reflected_value(snap, TOTAL_SUPPLY, r0).unwrap();
        let after = reflected_value(snap, TOTAL_SUPPLY, r1).unwrap();
        assert_eq!(before, 1_000 * ONE_TOKEN);
        assert!(after > before);
    }

    #[test]
    fn debit_snapshot_is_proportional() {
        assert_eq!(debit_snapshot(1_000, 100, 25).unwrap(), 750);
        assert_eq!(debit_snapshot(1_000, 100, 100).unwrap(), 0);
        assert_eq!(debit_snapshot(1_000, 0, 0).unwrap(), 0);
    }

    #[test]
    fn degenerate_denominator_reads_none() {
        assert_eq!(reflected_value(10, TOTAL_SUPPLY, 0), None);
        assert_eq!(reflected_value(10, 0, 10), None);
    }
}
