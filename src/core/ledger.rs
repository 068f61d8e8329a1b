//! Purchase ledger and return-request queue
//!
//! This module provides the `PurchaseLedger` component that records every
//! committed sale and tracks pending return requests against them.
//!
//! # Lifecycle
//!
//! A purchase row is appended on commit and destroyed only when a return on
//! it is resolved in either direction by an admin. A return request row is
//! created by the buyer inside the return window and destroyed on
//! resolution; the one-to-one keying on purchase id enforces at most one
//! open return per purchase.

use crate::types::{Purchase, PurchaseId, ReturnRequest, ShopError};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Append-style store of purchases plus the pending-return queue
#[derive(Debug)]
pub struct PurchaseLedger {
    /// Map of purchase id to purchase
    purchases: HashMap<PurchaseId, Purchase>,
    /// Open return requests, keyed by the purchase they reference
    returns: HashMap<PurchaseId, ReturnRequest>,
    /// Next id to assign
    next_id: PurchaseId,
}

impl PurchaseLedger {
    /// Create an empty ledger; ids start at 1
    pub fn new() -> Self {
        PurchaseLedger {
            purchases: HashMap::new(),
            returns: HashMap::new(),
            next_id: 1,
        }
    }

    /// Append a committed purchase, assigning the next sequential id
    pub fn record(
        &mut self,
        buyer: &str,
        product: crate::types::ProductId,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> PurchaseId {
        let id = self.next_id;
        self.next_id += 1;
        self.purchases.insert(
            id,
            Purchase {
                id,
                buyer: buyer.to_string(),
                product,
                quantity,
                at,
            },
        );
        id
    }

    /// Look up a purchase
    pub fn get(&self, id: PurchaseId) -> Option<&Purchase> {
        self.purchases.get(&id)
    }

    /// Look up a purchase, failing with `PurchaseNotFound`
    pub fn require(&self, id: PurchaseId) -> Result<&Purchase, ShopError> {
        self.purchases
            .get(&id)
            .ok_or(ShopError::PurchaseNotFound { purchase: id })
    }

    /// Whether a return request is open against this purchase
    pub fn has_open_return(&self, id: PurchaseId) -> bool {
        self.returns.contains_key(&id)
    }

    /// File a return request against a purchase
    ///
    /// # Errors
    ///
    /// Returns `DuplicateReturnRequest` if one is already open.
    pub fn file_return(&mut self, id: PurchaseId, at: DateTime<Utc>) -> Result<(), ShopError> {
        match self.returns.entry(id) {
            Entry::Occupied(_) => Err(ShopError::DuplicateReturnRequest { purchase: id }),
            Entry::Vacant(slot) => {
                slot.insert(ReturnRequest {
                    purchase: id,
                    requested_at: at,
                });
                Ok(())
            }
        }
    }

    /// Delete a purchase, cascading to any open return request
    ///
    /// Returns the removed purchase, or `None` if the id is unknown (a
    /// repeated delete therefore cannot double-refund).
    pub fn remove(&mut self, id: PurchaseId) -> Option<Purchase> {
        self.returns.remove(&id);
        self.purchases.remove(&id)
    }

    /// Delete only the return request, leaving the purchase standing
    ///
    /// # Errors
    ///
    /// Returns `ReturnNotFound` if no request is open for this purchase.
    pub fn withdraw_return(&mut self, id: PurchaseId) -> Result<ReturnRequest, ShopError> {
        self.returns
            .remove(&id)
            .ok_or(ShopError::ReturnNotFound { purchase: id })
    }

    /// A buyer's purchases, sorted by id
    pub fn purchases_for(&self, buyer: &str) -> Vec<&Purchase> {
        let mut purchases: Vec<&Purchase> = self
            .purchases
            .values()
            .filter(|p| p.buyer == buyer)
            .collect();
        purchases.sort_by_key(|p| p.id);
        purchases
    }

    /// All purchases, sorted by id
    pub fn all_sorted(&self) -> Vec<&Purchase> {
        let mut purchases: Vec<&Purchase> = self.purchases.values().collect();
        purchases.sort_by_key(|p| p.id);
        purchases
    }

    /// All open return requests, sorted by purchase id
    pub fn open_returns(&self) -> Vec<&ReturnRequest> {
        let mut returns: Vec<&ReturnRequest> = self.returns.values().collect();
        returns.sort_by_key(|r| r.purchase);
        returns
    }
}

impl Default for PurchaseLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn record_assigns_sequential_ids() {
        let mut ledger = PurchaseLedger::new();

        let first = ledger.record("alice", 1, 2, t0());
        let second = ledger.record("bob", 1, 1, t0());

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(ledger.require(1).unwrap().buyer, "alice");
        assert_eq!(ledger.require(2).unwrap().buyer, "bob");
    }

    #[test]
    fn require_missing_purchase_fails() {
        let ledger = PurchaseLedger::new();
        assert_eq!(
            ledger.require(9).unwrap_err(),
            ShopError::PurchaseNotFound { purchase: 9 }
        );
    }

    #[test]
    fn file_return_once_per_purchase() {
        let mut ledger = PurchaseLedger::new();
        let id = ledger.record("alice", 1, 2, t0());

        ledger.file_return(id, t0()).unwrap();
        let result = ledger.file_return(id, t0());

        assert_eq!(
            result.unwrap_err(),
            ShopError::DuplicateReturnRequest { purchase: id }
        );
        assert!(ledger.has_open_return(id));
    }

    #[test]
    fn remove_cascades_to_open_return() {
        let mut ledger = PurchaseLedger::new();
        let id = ledger.record("alice", 1, 2, t0());
        ledger.file_return(id, t0()).unwrap();

        let removed = ledger.remove(id);

        assert!(removed.is_some());
        assert!(ledger.get(id).is_none());
        assert!(!ledger.has_open_return(id));
        // Second delete finds nothing
        assert!(ledger.remove(id).is_none());
    }

    #[test]
    fn withdraw_return_leaves_purchase_standing() {
        let mut ledger = PurchaseLedger::new();
        let id = ledger.record("alice", 1, 2, t0());
        ledger.file_return(id, t0()).unwrap();

        ledger.withdraw_return(id).unwrap();

        assert!(ledger.get(id).is_some());
        assert!(!ledger.has_open_return(id));
        assert_eq!(
            ledger.withdraw_return(id).unwrap_err(),
            ShopError::ReturnNotFound { purchase: id }
        );
    }

    #[test]
    fn purchases_for_scopes_to_buyer() {
        let mut ledger = PurchaseLedger::new();
        ledger.record("alice", 1, 2, t0());
        ledger.record("bob", 2, 1, t0());
        ledger.record("alice", 2, 3, t0());

        let mine = ledger.purchases_for("alice");

        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, 1);
        assert_eq!(mine[1].id, 3);
    }

    #[test]
    fn open_returns_sorted_by_purchase_id() {
        let mut ledger = PurchaseLedger::new();
        for _ in 0..3 {
            ledger.record("alice", 1, 1, t0());
        }
        ledger.file_return(3, t0()).unwrap();
        ledger.file_return(1, t0()).unwrap();

        let ids: Vec<PurchaseId> = ledger.open_returns().iter().map(|r| r.purchase).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
