use crate::Error;

/// Process-wide halt switches consulted before any balance moves.
///
/// The blacklist lives next to the balances in contract storage; the ledger
/// checks the switches first, then both endpoints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct Switches {
    pub paused: bool,
    pub circuit_breaker: bool,
}

impl Switches {
    pub fn ensure_open(&self) -> Result<(), Error> {
        if self.circuit_breaker || self.paused {
            return Err(Error::AccessDenied);
        }
        Ok(())
    }

    /// Lifting the breaker also lifts a pause set during the incident.
    pub fn reset(&mut self) {
        self.circuit_breaker = false;
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_switch_blocks() {
        let mut s = Switches::default();
        assert_eq!(s.ensure_open(), Ok(()));
        s.paused = true;
        assert_eq!(s.ensure_open(), Err(Error::AccessDenied));
        s.paused = false;
        s.circuit_breaker = true;
        assert_eq!(s.ensure_open(), Err(Error::AccessDenied));
    }

    #[test]
    fn reset_clears_both() {
        let mut s = Switches { paused: true, circuit_breaker: true };
        s.reset();
        assert_eq!(s, Switches::default());
    }
}
