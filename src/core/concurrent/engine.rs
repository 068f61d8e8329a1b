//! Lock-per-row store engine
//!
//! Implements the same business rules as [`crate::core::engine::StoreEngine`]
//! for shared use. Products and profiles are versioned rows in `DashMap`s:
//! the commit step re-acquires the row locks in a fixed order (catalog
//! before profiles, same everywhere, so lock acquisition cannot cycle) and
//! checks the versions observed during validation. A version mismatch means
//! another writer committed in between; the whole read-validate-commit
//! sequence is retried up to the configured bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::core::auth::authorize;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::StoreConfig;
use crate::types::{
    Product, ProductId, Profile, Purchase, PurchaseId, PurchaseReceipt, RefundReceipt,
    RejectionReceipt, ReturnReceipt, ReturnRequest, Role, ShopError, UserId,
};

/// A row plus the count of commits that have touched it
#[derive(Debug)]
struct Versioned<T> {
    row: T,
    version: u64,
}

impl<T> Versioned<T> {
    fn new(row: T) -> Self {
        Versioned { row, version: 0 }
    }
}

/// Shareable storefront engine
///
/// All methods take `&self`; wrap in an `Arc` to serve multiple threads.
pub struct ConcurrentStoreEngine {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    catalog: DashMap<ProductId, Versioned<Product>>,
    profiles: DashMap<UserId, Versioned<Profile>>,
    purchases: DashMap<PurchaseId, Purchase>,
    returns: DashMap<PurchaseId, ReturnRequest>,
    next_purchase: AtomicU64,
}

impl ConcurrentStoreEngine {
    /// Create an engine on the system clock
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine with an injected clock
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        ConcurrentStoreEngine {
            config,
            clock,
            catalog: DashMap::new(),
            profiles: DashMap::new(),
            purchases: DashMap::new(),
            returns: DashMap::new(),
            next_purchase: AtomicU64::new(1),
        }
    }

    /// Register a user with the configured starting cash
    pub fn register(&self, user: &str, role: Role) -> Result<(), ShopError> {
        match self.profiles.entry(user.to_string()) {
            Entry::Occupied(_) => Err(ShopError::ProfileExists {
                user: user.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Versioned::new(Profile::new(
                    user,
                    self.config.starting_cash,
                    role,
                )));
                Ok(())
            }
        }
    }

    /// Create or replace a catalog product (admin only)
    pub fn stock_product(&self, actor: &str, product: Product) -> Result<(), ShopError> {
        let actor = self.profile(actor)?;
        authorize(&actor, Role::Admin, "manage the catalog")?;

        match self.catalog.entry(product.id) {
            Entry::Occupied(mut slot) => {
                let versioned = slot.get_mut();
                versioned.row = product;
                versioned.version += 1;
            }
            Entry::Vacant(slot) => {
                slot.insert(Versioned::new(product));
            }
        }
        Ok(())
    }

    /// Commit a purchase
    ///
    /// Snapshot, validate, then commit under the row locks if neither row
    /// changed since the snapshot. Retries on conflict up to
    /// `StoreConfig::commit_retries` times before returning
    /// `ConcurrencyConflict`.
    pub fn purchase(
        &self,
        buyer: &str,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<PurchaseReceipt, ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity);
        }

        for _ in 0..self.config.commit_retries {
            let (product, product_version) = self.snapshot_product(product_id)?;
            let (profile, profile_version) = self.snapshot_profile(buyer)?;

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

            let new_cash = profile
                .cash
                .checked_sub(total)
                .ok_or_else(|| ShopError::arithmetic_overflow("debit"))?;

            // Commit: catalog row first, then the profile row.
            let Some(mut product_row) = self.catalog.get_mut(&product_id) else {
                return Err(ShopError::ProductNotFound {
                    product: product_id,
                });
            };
            if product_row.version != product_version {
                continue;
            }
            let Some(mut profile_row) = self.profiles.get_mut(buyer) else {
                return Err(ShopError::ProfileNotFound {
                    user: buyer.to_string(),
                });
            };
            if profile_row.version != profile_version {
                continue;
            }

            product_row.row.stock -= quantity;
            product_row.version += 1;
            profile_row.row.cash = new_cash;
            profile_row.version += 1;
            drop(profile_row);
            drop(product_row);

            let id = self.next_purchase.fetch_add(1, Ordering::Relaxed);
            let now = self.clock.now();
            self.purchases.insert(
                id,
                Purchase {
                    id,
                    buyer: buyer.to_string(),
                    product: product_id,
                    quantity,
                    at: now,
                },
            );

            return Ok(PurchaseReceipt {
                purchase: id,
                buyer: buyer.to_string(),
                product_name: product.name,
                quantity,
                total,
            });
        }

        Err(ShopError::concurrency_conflict("purchase"))
    }

    /// File a return request against a purchase
    pub fn request_return(
        &self,
        buyer: &str,
        purchase_id: PurchaseId,
    ) -> Result<ReturnReceipt, ShopError> {
        self.profile(buyer)?;
        let purchase = self.purchase_row(purchase_id)?;

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

        let (product, _) = self.snapshot_product(purchase.product)?;

        match self.returns.entry(purchase_id) {
            Entry::Occupied(_) => Err(ShopError::DuplicateReturnRequest {
                purchase: purchase_id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(ReturnRequest {
                    purchase: purchase_id,
                    requested_at: now,
                });
                Ok(ReturnReceipt {
                    purchase: purchase_id,
                    product_name: product.name,
                    quantity: purchase.quantity,
                    purchased_at: purchase.at,
                })
            }
        }
    }

    /// Approve a return (admin only)
    ///
    /// The purchase row is removed up front so only one resolver can reach
    /// the refund; it is reinserted if the commit fails.
    pub fn approve_return(
        &self,
        actor: &str,
        purchase_id: PurchaseId,
    ) -> Result<RefundReceipt, ShopError> {
        let actor = self.profile(actor)?;
        authorize(&actor, Role::Admin, "approve returns")?;

        let Some((_, purchase)) = self.purchases.remove(&purchase_id) else {
            return Err(ShopError::PurchaseNotFound {
                purchase: purchase_id,
            });
        };

        match self.commit_refund(&purchase) {
            Ok((refund, product_name)) => {
                self.returns.remove(&purchase_id);
                Ok(RefundReceipt {
                    purchase: purchase_id,
                    buyer: purchase.buyer,
                    product_name,
                    quantity: purchase.quantity,
                    refund,
                })
            }
            Err(err) => {
                self.purchases.insert(purchase_id, purchase);
                Err(err)
            }
        }
    }

    /// Reject a return (admin only): drop the request, keep the purchase
    pub fn reject_return(
        &self,
        actor: &str,
        purchase_id: PurchaseId,
    ) -> Result<RejectionReceipt, ShopError> {
        let actor = self.profile(actor)?;
        authorize(&actor, Role::Admin, "reject returns")?;

        let purchase = self.purchase_row(purchase_id)?;
        let (product, _) = self.snapshot_product(purchase.product)?;

        if self.returns.remove(&purchase_id).is_none() {
            return Err(ShopError::ReturnNotFound {
                purchase: purchase_id,
            });
        }

        Ok(RejectionReceipt {
            purchase: purchase_id,
            buyer: purchase.buyer,
            product_name: product.name,
        })
    }

    /// Current state of a profile
    pub fn profile(&self, user: &str) -> Result<Profile, ShopError> {
        self.profiles
            .get(user)
            .map(|r| r.row.clone())
            .ok_or_else(|| ShopError::ProfileNotFound {
                user: user.to_string(),
            })
    }

    /// Current state of a product
    pub fn product(&self, id: ProductId) -> Result<Product, ShopError> {
        self.catalog
            .get(&id)
            .map(|r| r.row.clone())
            .ok_or(ShopError::ProductNotFound { product: id })
    }

    /// Number of purchases currently in the ledger
    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }

    fn snapshot_product(&self, id: ProductId) -> Result<(Product, u64), ShopError> {
        self.catalog
            .get(&id)
            .map(|r| (r.row.clone(), r.version))
            .ok_or(ShopError::ProductNotFound { product: id })
    }

    fn snapshot_profile(&self, user: &str) -> Result<(Profile, u64), ShopError> {
        self.profiles
            .get(user)
            .map(|r| (r.row.clone(), r.version))
            .ok_or_else(|| ShopError::ProfileNotFound {
                user: user.to_string(),
            })
    }

    fn purchase_row(&self, id: PurchaseId) -> Result<Purchase, ShopError> {
        self.purchases
            .get(&id)
            .map(|r| r.clone())
            .ok_or(ShopError::PurchaseNotFound { purchase: id })
    }

    /// Restock and credit under the row locks, catalog first
    ///
    /// Products and profiles are never deleted, so the lookups only fail if
    /// the caller raced a row that never existed.
    fn commit_refund(&self, purchase: &Purchase) -> Result<(Decimal, String), ShopError> {
        let Some(mut product_row) = self.catalog.get_mut(&purchase.product) else {
            return Err(ShopError::ProductNotFound {
                product: purchase.product,
            });
        };

        let refund = product_row
            .row
            .price
            .checked_mul(Decimal::from(purchase.quantity))
            .ok_or_else(|| ShopError::arithmetic_overflow("refund"))?;
        let new_stock = product_row
            .row
            .stock
            .checked_add(purchase.quantity)
            .ok_or_else(|| ShopError::arithmetic_overflow("restock"))?;

        let Some(mut profile_row) = self.profiles.get_mut(&purchase.buyer) else {
            return Err(ShopError::ProfileNotFound {
                user: purchase.buyer.clone(),
            });
        };
        let new_cash = profile_row
            .row
            .cash
            .checked_add(refund)
            .ok_or_else(|| ShopError::arithmetic_overflow("credit"))?;

        product_row.row.stock = new_stock;
        product_row.version += 1;
        profile_row.row.cash = new_cash;
        profile_row.version += 1;

        Ok((refund, product_row.row.name.clone()))
    }
}
