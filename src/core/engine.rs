//! Store transaction engine
//!
//! This module provides the `StoreEngine` that orchestrates the purchase and
//! return flows by coordinating the catalog, profile, and ledger stores.
//!
//! The engine enforces the business rules:
//! - A purchase debits cash, decrements stock, and appends a ledger row
//!   together or not at all
//! - A return request may only be filed by the buyer, inside the return
//!   window, and only once per purchase
//! - Approval refunds quantity x unit price and restocks by quantity;
//!   rejection removes only the request
//!
//! Every operation validates against read state first and mutates only once
//! validation has fully passed, so a rejected operation leaves all three
//! stores exactly as they were.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::accounts::Accounts;
use crate::core::auth::authorize;
use crate::core::catalog::Catalog;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::StoreConfig;
use crate::core::ledger::PurchaseLedger;
use crate::types::{
    Product, ProductId, Profile, PurchaseId, PurchaseLine, PurchaseReceipt, RefundReceipt,
    RejectionReceipt, ReturnLine, ReturnReceipt, Role, ShopError,
};

/// Storefront transaction engine
///
/// Owns the catalog, profile, and ledger stores and is the only writer to
/// any of them. One engine handles one logical request at a time (`&mut
/// self`); see [`crate::core::concurrent`] for the shareable variant.
pub struct StoreEngine {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    catalog: Catalog,
    accounts: Accounts,
    ledger: PurchaseLedger,
}

impl StoreEngine {
    /// Create an engine on the system clock
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine with an injected clock (tests, deterministic replay)
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        StoreEngine {
            config,
            clock,
            catalog: Catalog::new(),
            accounts: Accounts::new(),
            ledger: PurchaseLedger::new(),
        }
    }

    /// Register a user: create the account, then its profile
    ///
    /// Profile creation is an explicit post-registration step with the
    /// configured starting balance, not a side effect of a save hook.
    ///
    /// # Errors
    ///
    /// Returns `ProfileExists` if the user is already registered.
    pub fn register(&mut self, user: &str, role: Role) -> Result<(), ShopError> {
        self.accounts
            .register(user, role, self.config.starting_cash)
    }

    /// Create or update a catalog product (admin only)
    ///
    /// # Errors
    ///
    /// Returns `ProfileNotFound` for an unknown actor or `Forbidden` for a
    /// non-admin one.
    pub fn stock_product(&mut self, actor: &str, product: Product) -> Result<(), ShopError> {
        let actor = self.accounts.require(actor)?;
        authorize(actor, Role::Admin, "manage the catalog")?;

        self.catalog.upsert(product);
        Ok(())
    }

    /// Commit a purchase
    ///
    /// Validates quantity, stock, and funds against read state, then applies
    /// all three mutations: debit cash, decrement stock, append the ledger
    /// row with a server-assigned timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error without touching any store if:
    /// - the quantity is zero
    /// - the buyer or product does not exist
    /// - fewer than `quantity` units are in stock (`InsufficientStock`
    ///   carries the available count)
    /// - the total cost is not strictly below the buyer's cash
    ///   (`InsufficientFunds` carries the shortfall)
    pub fn purchase(
        &mut self,
        buyer: &str,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<PurchaseReceipt, ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity);
        }

        let profile = self.accounts.require(buyer)?;
        let product = self.catalog.require(product_id)?;

        let total = product
            .price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| ShopError::arithmetic_overflow("purchase total"))?;

        if quantity > product.stock {
            return Err(ShopError::insufficient_stock(
                product_id,
                product.stock,
                quantity,
            ));
        }

        if total >= profile.cash {
            return Err(ShopError::insufficient_funds(buyer, total, profile.cash));
        }

        let product_name = product.name.clone();

        // Validation passed; none of these mutations can fail now.
        let now = self.clock.now();
        self.catalog.remove_stock(product_id, quantity)?;
        self.accounts.debit(buyer, total)?;
        let id = self.ledger.record(buyer, product_id, quantity, now);

        tracing::debug!(purchase = id, buyer, product = product_id, quantity, %total, "purchase committed");

        Ok(PurchaseReceipt {
            purchase: id,
            buyer: buyer.to_string(),
            product_name,
            quantity,
            total,
        })
    }

    /// File a return request against a purchase
    ///
    /// Inserts only the request row; the refund happens on approval.
    ///
    /// # Errors
    ///
    /// Returns an error without touching any store if:
    /// - the requester or purchase does not exist
    /// - the purchase belongs to a different buyer (`OwnerMismatch`)
    /// - more than the return window has elapsed (`ReturnWindowExpired`)
    /// - a request is already open (`DuplicateReturnRequest`)
    pub fn request_return(
        &mut self,
        buyer: &str,
        purchase_id: PurchaseId,
    ) -> Result<ReturnReceipt, ShopError> {
        self.accounts.require(buyer)?;
        let purchase = self.ledger.require(purchase_id)?;

        if purchase.buyer != buyer {
            return Err(ShopError::owner_mismatch(
                purchase_id,
                &purchase.buyer,
                buyer,
            ));
        }

        let now = self.clock.now();
        let elapsed = now - purchase.at;
        if elapsed > self.config.return_window {
            return Err(ShopError::window_expired(
                purchase_id,
                elapsed.num_seconds(),
                self.config.return_window.num_seconds(),
            ));
        }

        let product_name = self.catalog.require(purchase.product)?.name.clone();
        let quantity = purchase.quantity;
        let purchased_at = purchase.at;

        self.ledger.file_return(purchase_id, now)?;

        tracing::debug!(purchase = purchase_id, buyer, "return request filed");

        Ok(ReturnReceipt {
            purchase: purchase_id,
            product_name,
            quantity,
            purchased_at,
        })
    }

    /// Approve a return (admin only): refund, restock, delete the purchase
    ///
    /// The refund is quantity x current unit price; the stock count grows by
    /// the quantity. Deleting the purchase cascades to any open return
    /// request, so a repeated approve fails with `PurchaseNotFound` instead
    /// of refunding twice.
    pub fn approve_return(
        &mut self,
        actor: &str,
        purchase_id: PurchaseId,
    ) -> Result<RefundReceipt, ShopError> {
        let actor = self.accounts.require(actor)?;
        authorize(actor, Role::Admin, "approve returns")?;

        let purchase = self.ledger.require(purchase_id)?.clone();
        let product = self.catalog.require(purchase.product)?;

        let refund = product
            .price
            .checked_mul(Decimal::from(purchase.quantity))
            .ok_or_else(|| ShopError::arithmetic_overflow("refund"))?;
        self.accounts.require(&purchase.buyer)?;
        let product_name = product.name.clone();

        // Validation passed; restock by quantity, credit the refund, drop
        // the purchase row (and with it any open return).
        self.catalog.add_stock(purchase.product, purchase.quantity)?;
        self.accounts.credit(&purchase.buyer, refund)?;
        self.ledger.remove(purchase_id);

        tracing::debug!(purchase = purchase_id, buyer = %purchase.buyer, %refund, "return approved");

        Ok(RefundReceipt {
            purchase: purchase_id,
            buyer: purchase.buyer,
            product_name,
            quantity: purchase.quantity,
            refund,
        })
    }

    /// Reject a return (admin only): delete the request, keep everything else
    ///
    /// Purchase, stock, and cash are untouched; the buyer keeps the item.
    pub fn reject_return(
        &mut self,
        actor: &str,
        purchase_id: PurchaseId,
    ) -> Result<RejectionReceipt, ShopError> {
        let actor = self.accounts.require(actor)?;
        authorize(actor, Role::Admin, "reject returns")?;

        if !self.ledger.has_open_return(purchase_id) {
            return Err(ShopError::ReturnNotFound {
                purchase: purchase_id,
            });
        }

        let purchase = self.ledger.require(purchase_id)?.clone();
        let product_name = self.catalog.require(purchase.product)?.name.clone();

        self.ledger.withdraw_return(purchase_id)?;

        tracing::debug!(purchase = purchase_id, buyer = %purchase.buyer, "return rejected");

        Ok(RejectionReceipt {
            purchase: purchase_id,
            buyer: purchase.buyer,
            product_name,
        })
    }

    /// A buyer's purchase history with the derived per-row total
    pub fn purchase_history(&self, buyer: &str) -> Vec<PurchaseLine> {
        self.ledger
            .purchases_for(buyer)
            .into_iter()
            .filter_map(|p| self.purchase_line(p))
            .collect()
    }

    /// Every purchase in the ledger with the derived per-row total
    pub fn all_purchases(&self) -> Vec<PurchaseLine> {
        self.ledger
            .all_sorted()
            .into_iter()
            .filter_map(|p| self.purchase_line(p))
            .collect()
    }

    /// The global pending-return listing (admin view)
    pub fn pending_returns(&self) -> Vec<ReturnLine> {
        self.ledger
            .open_returns()
            .into_iter()
            .filter_map(|r| {
                let purchase = self.ledger.get(r.purchase)?;
                let product = self.catalog.get(purchase.product)?;
                let refund_value = product
                    .price
                    .checked_mul(Decimal::from(purchase.quantity))?;
                Some(ReturnLine {
                    purchase: purchase.id,
                    buyer: purchase.buyer.clone(),
                    product: product.id,
                    product_name: product.name.clone(),
                    quantity: purchase.quantity,
                    refund_value,
                    requested_at: r.requested_at,
                })
            })
            .collect()
    }

    /// All catalog products, sorted by id
    pub fn products(&self) -> Vec<&Product> {
        self.catalog.all_sorted()
    }

    /// All profiles, sorted by user
    pub fn profiles(&self) -> Vec<&Profile> {
        self.accounts.all_sorted()
    }

    fn purchase_line(&self, purchase: &crate::types::Purchase) -> Option<PurchaseLine> {
        let product = self.catalog.get(purchase.product)?;
        let total = product
            .price
            .checked_mul(Decimal::from(purchase.quantity))?;
        Some(PurchaseLine {
            purchase: purchase.id,
            buyer: purchase.buyer.clone(),
            product: product.id,
            product_name: product.name.clone(),
            quantity: purchase.quantity,
            unit_price: product.price,
            total,
            at: purchase.at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn money(value: i64) -> Decimal {
        Decimal::new(value * 100, 2)
    }

    /// Engine with a frozen clock, one admin, one buyer with 250.00 cash,
    /// and one product (stock 5, price 100.00): the worked example from the
    /// storefront's transaction rules.
    fn scenario() -> (StoreEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        ));
        let config = StoreConfig {
            starting_cash: money(250),
            ..StoreConfig::default()
        };
        let mut engine = StoreEngine::with_clock(config, clock.clone());

        engine.register("root", Role::Admin).unwrap();
        engine.register("alice", Role::Customer).unwrap();
        engine
            .stock_product("root", Product::new(1, "Widget", money(100), 5))
            .unwrap();

        (engine, clock)
    }

    fn cash_of(engine: &StoreEngine, user: &str) -> Decimal {
        engine.profiles().iter().find(|p| p.user == user).unwrap().cash
    }

    fn stock_of(engine: &StoreEngine, id: ProductId) -> u32 {
        engine.products().iter().find(|p| p.id == id).unwrap().stock
    }

    #[test]
    fn purchase_debits_cash_decrements_stock_appends_row() {
        let (mut engine, _) = scenario();

        let receipt = engine.purchase("alice", 1, 2).unwrap();

        assert_eq!(receipt.quantity, 2);
        assert_eq!(receipt.total, money(200));
        assert_eq!(receipt.product_name, "Widget");
        assert_eq!(stock_of(&engine, 1), 3);
        assert_eq!(cash_of(&engine, "alice"), money(50));

        let history = engine.purchase_history("alice");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, 2);
        assert_eq!(history[0].total, money(200));
    }

    #[test]
    fn purchase_rejected_on_insufficient_funds_leaves_state_unchanged() {
        let (mut engine, _) = scenario();

        // 3 x 100.00 = 300.00 against 250.00 cash
        let result = engine.purchase("alice", 1, 3);

        assert_eq!(
            result.unwrap_err(),
            ShopError::insufficient_funds("alice", money(300), money(250))
        );
        assert_eq!(stock_of(&engine, 1), 5);
        assert_eq!(cash_of(&engine, "alice"), money(250));
        assert!(engine.purchase_history("alice").is_empty());
    }

    #[test]
    fn purchase_rejected_on_insufficient_stock_carries_available_count() {
        let (mut engine, _) = scenario();

        let result = engine.purchase("alice", 1, 6);

        assert_eq!(result.unwrap_err(), ShopError::insufficient_stock(1, 5, 6));
        assert_eq!(stock_of(&engine, 1), 5);
        assert_eq!(cash_of(&engine, "alice"), money(250));
    }

    #[test]
    fn purchase_cost_equal_to_cash_is_rejected() {
        let (mut engine, _) = scenario();

        // Strict comparison: 250.00 total against 250.00 cash fails with a
        // zero shortfall.
        let result = engine.purchase("alice", 1, 5);
        let err = result.unwrap_err();
        assert!(matches!(&err, ShopError::InsufficientFunds { shortfall, .. } if shortfall.is_zero()));
    }

    #[test]
    fn purchase_zero_quantity_is_rejected() {
        let (mut engine, _) = scenario();
        assert_eq!(
            engine.purchase("alice", 1, 0).unwrap_err(),
            ShopError::InvalidQuantity
        );
    }

    #[test]
    fn purchase_unknown_product_or_buyer_fails() {
        let (mut engine, _) = scenario();

        assert!(matches!(
            engine.purchase("alice", 9, 1).unwrap_err(),
            ShopError::ProductNotFound { .. }
        ));
        assert!(matches!(
            engine.purchase("ghost", 1, 1).unwrap_err(),
            ShopError::ProfileNotFound { .. }
        ));
    }

    #[test]
    fn stock_product_requires_admin() {
        let (mut engine, _) = scenario();

        let result = engine.stock_product("alice", Product::new(2, "Gadget", money(10), 1));

        assert!(matches!(result.unwrap_err(), ShopError::Forbidden { .. }));
        assert_eq!(engine.products().len(), 1);
    }

    #[test]
    fn return_inside_window_files_request_without_other_mutation() {
        let (mut engine, clock) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        clock.advance(Duration::minutes(2));
        let ret = engine.request_return("alice", receipt.purchase).unwrap();

        assert_eq!(ret.quantity, 2);
        assert_eq!(ret.product_name, "Widget");
        // Only the request row exists; stock and cash are untouched until
        // approval.
        assert_eq!(stock_of(&engine, 1), 3);
        assert_eq!(cash_of(&engine, "alice"), money(50));
        assert_eq!(engine.pending_returns().len(), 1);
    }

    #[test]
    fn return_after_window_is_rejected() {
        let (mut engine, clock) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        clock.advance(Duration::minutes(4));
        let result = engine.request_return("alice", receipt.purchase);

        assert_eq!(
            result.unwrap_err(),
            ShopError::window_expired(receipt.purchase, 240, 180)
        );
        assert!(engine.pending_returns().is_empty());
    }

    #[test]
    fn return_exactly_at_window_boundary_is_accepted() {
        let (mut engine, clock) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        clock.advance(Duration::minutes(3));
        assert!(engine.request_return("alice", receipt.purchase).is_ok());
    }

    #[test]
    fn second_return_request_is_rejected() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        engine.request_return("alice", receipt.purchase).unwrap();
        let result = engine.request_return("alice", receipt.purchase);

        assert_eq!(
            result.unwrap_err(),
            ShopError::DuplicateReturnRequest {
                purchase: receipt.purchase
            }
        );
    }

    #[test]
    fn return_by_non_owner_is_rejected() {
        let (mut engine, _) = scenario();
        engine.register("bob", Role::Customer).unwrap();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        let result = engine.request_return("bob", receipt.purchase);

        assert_eq!(
            result.unwrap_err(),
            ShopError::owner_mismatch(receipt.purchase, "alice", "bob")
        );
    }

    #[test]
    fn approve_refunds_restocks_and_removes_both_rows() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();
        engine.request_return("alice", receipt.purchase).unwrap();

        let refund = engine.approve_return("root", receipt.purchase).unwrap();

        assert_eq!(refund.refund, money(200));
        assert_eq!(refund.quantity, 2);
        assert_eq!(refund.buyer, "alice");
        assert_eq!(stock_of(&engine, 1), 5);
        assert_eq!(cash_of(&engine, "alice"), money(250));
        assert!(engine.purchase_history("alice").is_empty());
        assert!(engine.pending_returns().is_empty());
    }

    #[test]
    fn restock_uses_quantity_not_cost() {
        let (mut engine, _) = scenario();
        // 2 units at 100.00: a cost-based restock would add 200 units.
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        engine.approve_return("root", receipt.purchase).unwrap();

        assert_eq!(stock_of(&engine, 1), 5);
    }

    #[test]
    fn repeated_approve_fails_instead_of_double_refunding() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();
        engine.approve_return("root", receipt.purchase).unwrap();

        let result = engine.approve_return("root", receipt.purchase);

        assert_eq!(
            result.unwrap_err(),
            ShopError::PurchaseNotFound {
                purchase: receipt.purchase
            }
        );
        assert_eq!(cash_of(&engine, "alice"), money(250));
        assert_eq!(stock_of(&engine, 1), 5);
    }

    #[test]
    fn reject_removes_only_the_return_row() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();
        engine.request_return("alice", receipt.purchase).unwrap();

        let rejection = engine.reject_return("root", receipt.purchase).unwrap();

        assert_eq!(rejection.buyer, "alice");
        assert!(engine.pending_returns().is_empty());
        // Purchase stands, stock and cash untouched
        assert_eq!(engine.purchase_history("alice").len(), 1);
        assert_eq!(stock_of(&engine, 1), 3);
        assert_eq!(cash_of(&engine, "alice"), money(50));
    }

    #[test]
    fn reject_without_open_return_fails() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        let result = engine.reject_return("root", receipt.purchase);

        assert_eq!(
            result.unwrap_err(),
            ShopError::ReturnNotFound {
                purchase: receipt.purchase
            }
        );
    }

    #[test]
    fn resolution_requires_admin() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();
        engine.request_return("alice", receipt.purchase).unwrap();

        assert!(matches!(
            engine.approve_return("alice", receipt.purchase).unwrap_err(),
            ShopError::Forbidden { .. }
        ));
        assert!(matches!(
            engine.reject_return("alice", receipt.purchase).unwrap_err(),
            ShopError::Forbidden { .. }
        ));
        // Request still pending
        assert_eq!(engine.pending_returns().len(), 1);
    }

    #[test]
    fn approve_without_prior_request_still_resolves_the_purchase() {
        // An admin may accept a return by deleting the purchase directly.
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();

        let refund = engine.approve_return("root", receipt.purchase).unwrap();

        assert_eq!(refund.refund, money(200));
        assert_eq!(stock_of(&engine, 1), 5);
        assert_eq!(cash_of(&engine, "alice"), money(250));
    }

    #[test]
    fn pending_returns_carry_derived_refund_value() {
        let (mut engine, _) = scenario();
        let receipt = engine.purchase("alice", 1, 2).unwrap();
        engine.request_return("alice", receipt.purchase).unwrap();

        let pending = engine.pending_returns();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].refund_value, money(200));
        assert_eq!(pending[0].buyer, "alice");
        assert_eq!(pending[0].product_name, "Widget");
    }

    #[test]
    fn registration_grants_configured_starting_cash() {
        let config = StoreConfig {
            starting_cash: money(42),
            ..StoreConfig::default()
        };
        let mut engine = StoreEngine::new(config);

        engine.register("dora", Role::Customer).unwrap();

        assert_eq!(cash_of(&engine, "dora"), money(42));
        assert!(matches!(
            engine.register("dora", Role::Customer).unwrap_err(),
            ShopError::ProfileExists { .. }
        ));
    }
}
