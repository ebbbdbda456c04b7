//! Currency contracts consumed by placement, upgrades and wave rewards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency store mutated exclusively through spend and add operations.
pub trait Ledger: fmt::Debug {
    /// Current balance held by the ledger.
    fn balance(&self) -> u32;

    /// Removes `amount` when the balance covers it.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    fn try_spend(&mut self, amount: u32) -> bool;

    /// Credits `amount` to the ledger.
    fn add(&mut self, amount: u32);
}

/// In-memory ledger used for every currency the simulation tracks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balance: u32,
}

impl Wallet {
    /// Creates a wallet holding the provided opening balance.
    #[must_use]
    pub const fn with_balance(balance: u32) -> Self {
        Self { balance }
    }

    /// Moves the full balance out of the wallet, leaving it empty.
    pub fn drain(&mut self) -> u32 {
        std::mem::take(&mut self.balance)
    }
}

impl Ledger for Wallet {
    fn balance(&self) -> u32 {
        self.balance
    }

    fn try_spend(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                true
            }
            None => false,
        }
    }

    fn add(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_refuses_overdraft_without_mutation() {
        let mut wallet = Wallet::with_balance(50);
        assert!(!wallet.try_spend(51));
        assert_eq!(wallet.balance(), 50);
        assert!(wallet.try_spend(50));
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn drain_empties_the_wallet() {
        let mut wallet = Wallet::with_balance(150);
        assert_eq!(wallet.drain(), 150);
        assert_eq!(wallet.balance(), 0);
    }
}
