//! Profile store
//!
//! This module provides the `Accounts` struct which maintains every user
//! profile and its cash balance.
//!
//! Accounts is responsible for:
//! - Creating a profile at registration with the configured starting cash
//! - Debiting and crediting balances with checked arithmetic
//! - Enforcing that no balance ever goes negative
//! - Providing sorted profile listings for output

use crate::types::{Profile, Role, ShopError, UserId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Manages all user profiles
///
/// Profiles are kept in an in-memory map keyed by user. Registration is the
/// only way a profile comes into existence; purchase and return flows only
/// move cash on profiles that already exist.
#[derive(Debug, Default)]
pub struct Accounts {
    /// Map of user to profile
    profiles: HashMap<UserId, Profile>,
}

impl Accounts {
    /// Create an empty store with no profiles
    pub fn new() -> Self {
        Accounts {
            profiles: HashMap::new(),
        }
    }

    /// Create a profile for a newly registered user
    ///
    /// Registration is an explicit step: create the account, then create the
    /// profile with its starting balance. A second registration for the same
    /// user is rejected rather than silently replacing the balance.
    ///
    /// # Errors
    ///
    /// Returns `ProfileExists` if the user already has a profile.
    pub fn register(
        &mut self,
        user: &str,
        role: Role,
        starting_cash: Decimal,
    ) -> Result<(), ShopError> {
        if self.profiles.contains_key(user) {
            return Err(ShopError::ProfileExists {
                user: user.to_string(),
            });
        }
        self.profiles
            .insert(user.to_string(), Profile::new(user, starting_cash, role));
        Ok(())
    }

    /// Look up a profile
    pub fn get(&self, user: &str) -> Option<&Profile> {
        self.profiles.get(user)
    }

    /// Look up a profile, failing with `ProfileNotFound`
    pub fn require(&self, user: &str) -> Result<&Profile, ShopError> {
        self.profiles.get(user).ok_or_else(|| ShopError::ProfileNotFound {
            user: user.to_string(),
        })
    }

    /// Mutable lookup, failing with `ProfileNotFound`
    pub fn require_mut(&mut self, user: &str) -> Result<&mut Profile, ShopError> {
        self.profiles
            .get_mut(user)
            .ok_or_else(|| ShopError::ProfileNotFound {
                user: user.to_string(),
            })
    }

    /// Debit a user's cash balance
    ///
    /// Validates that the balance covers the amount before mutating; a
    /// rejected debit leaves the balance untouched.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if `amount` exceeds the balance, or
    /// `ArithmeticOverflow` if the subtraction cannot be represented.
    pub fn debit(&mut self, user: &str, amount: Decimal) -> Result<(), ShopError> {
        let profile = self.require_mut(user)?;

        if amount > profile.cash {
            return Err(ShopError::insufficient_funds(user, amount, profile.cash));
        }

        let new_cash = profile
            .cash
            .checked_sub(amount)
            .ok_or_else(|| ShopError::arithmetic_overflow("debit"))?;

        profile.cash = new_cash;
        Ok(())
    }

    /// Credit a user's cash balance
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the addition cannot be represented.
    pub fn credit(&mut self, user: &str, amount: Decimal) -> Result<(), ShopError> {
        let profile = self.require_mut(user)?;

        let new_cash = profile
            .cash
            .checked_add(amount)
            .ok_or_else(|| ShopError::arithmetic_overflow("credit"))?;

        profile.cash = new_cash;
        Ok(())
    }

    /// All profiles sorted by user for deterministic output
    pub fn all_sorted(&self) -> Vec<&Profile> {
        let mut profiles: Vec<&Profile> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.user.cmp(&b.user));
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cash(value: i64) -> Decimal {
        Decimal::new(value * 100, 2)
    }

    #[test]
    fn new_store_is_empty() {
        let accounts = Accounts::new();
        assert!(accounts.all_sorted().is_empty());
    }

    #[test]
    fn register_creates_profile_with_starting_cash() {
        let mut accounts = Accounts::new();

        accounts
            .register("alice", Role::Customer, cash(10000))
            .unwrap();

        let profile = accounts.require("alice").unwrap();
        assert_eq!(profile.user, "alice");
        assert_eq!(profile.cash, cash(10000));
        assert_eq!(profile.role, Role::Customer);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut accounts = Accounts::new();
        accounts
            .register("alice", Role::Customer, cash(10000))
            .unwrap();

        let result = accounts.register("alice", Role::Admin, cash(0));

        assert_eq!(
            result.unwrap_err(),
            ShopError::ProfileExists {
                user: "alice".to_string()
            }
        );
        // Original profile untouched
        assert_eq!(accounts.require("alice").unwrap().cash, cash(10000));
    }

    #[test]
    fn require_unknown_user_fails() {
        let accounts = Accounts::new();
        assert!(matches!(
            accounts.require("ghost"),
            Err(ShopError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn debit_decreases_balance() {
        let mut accounts = Accounts::new();
        accounts
            .register("alice", Role::Customer, cash(250))
            .unwrap();

        accounts.debit("alice", cash(200)).unwrap();

        assert_eq!(accounts.require("alice").unwrap().cash, cash(50));
    }

    #[test]
    fn debit_beyond_balance_is_rejected_without_mutation() {
        let mut accounts = Accounts::new();
        accounts
            .register("alice", Role::Customer, cash(250))
            .unwrap();

        let result = accounts.debit("alice", cash(300));

        assert!(matches!(
            result.unwrap_err(),
            ShopError::InsufficientFunds { .. }
        ));
        assert_eq!(accounts.require("alice").unwrap().cash, cash(250));
    }

    #[test]
    fn debit_entire_balance_reaches_zero_not_negative() {
        let mut accounts = Accounts::new();
        accounts
            .register("alice", Role::Customer, cash(250))
            .unwrap();

        accounts.debit("alice", cash(250)).unwrap();

        assert_eq!(accounts.require("alice").unwrap().cash, cash(0));
    }

    #[test]
    fn credit_increases_balance() {
        let mut accounts = Accounts::new();
        accounts.register("alice", Role::Customer, cash(50)).unwrap();

        accounts.credit("alice", cash(200)).unwrap();

        assert_eq!(accounts.require("alice").unwrap().cash, cash(250));
    }

    #[test]
    fn credit_overflow_is_rejected_without_mutation() {
        let mut accounts = Accounts::new();
        accounts
            .register("alice", Role::Customer, Decimal::MAX)
            .unwrap();

        let result = accounts.credit("alice", Decimal::ONE);

        if result.is_err() {
            assert!(matches!(
                result.unwrap_err(),
                ShopError::ArithmeticOverflow { .. }
            ));
            assert_eq!(accounts.require("alice").unwrap().cash, Decimal::MAX);
        }
    }

    #[test]
    fn all_sorted_orders_by_user() {
        let mut accounts = Accounts::new();
        accounts.register("carol", Role::Customer, cash(1)).unwrap();
        accounts.register("alice", Role::Customer, cash(2)).unwrap();
        accounts.register("bob", Role::Customer, cash(3)).unwrap();

        let users: Vec<&str> = accounts
            .all_sorted()
            .iter()
            .map(|p| p.user.as_str())
            .collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
    }
}
