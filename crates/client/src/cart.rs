//! Cart Aggregate
//!
//! Presents the server's cart as a seller-grouped view and mediates all
//! mutations. The service keeps a read-through cache of the server state and
//! never commits a local change until the server confirms it: a failed call
//! leaves the cache exactly as it was.

use std::sync::Arc;

use jiff::{Timestamp, civil::Date};
use peony::{
    cart::{CartSnapshot, SellerGroup, group_by_seller},
    ids::ProductId,
    reservation::ReservationStatus,
};
use thiserror::Error;
use tracing::debug;

use crate::api::{
    ApiError, ShopApi,
    models::{AddItemRequest, UpdateItemRequest},
};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity zero is invalid, not a deletion signal; use `remove_item`.
    #[error("quantity must be at least 1; use remove_item to delete a line")]
    InvalidQuantity,

    /// The backend call failed; the local cache is untouched.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The authoritative-cart mediator for a registered buyer.
#[derive(Clone)]
pub struct CartService {
    api: Arc<dyn ShopApi>,
    snapshot: CartSnapshot,
}

impl CartService {
    /// Create a service with an empty local cache; call [`Self::load`] before
    /// first display.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>) -> Self {
        Self {
            api,
            snapshot: CartSnapshot::empty(),
        }
    }

    /// The current cached snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Fetch the full cart and replace the cache wholesale.
    ///
    /// No partial merge: after any external change (another device editing
    /// the same cart) a load shows the server's truth.
    pub async fn load(&mut self) -> Result<(), CartError> {
        self.snapshot = self.api.fetch_cart().await?;

        debug!(lines = self.snapshot.lines.len(), "cart loaded");

        Ok(())
    }

    /// Request a new reservation for `quantity` of a product.
    ///
    /// On success the returned line (with a fresh `reserved_at`) replaces any
    /// existing line for that product. If the backend cannot hold the
    /// requested quantity the call fails with [`ApiError::OutOfStock`] or
    /// [`ApiError::ReservationDenied`]; the quantity is never silently
    /// reduced.
    pub async fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        preorder_delivery_date: Option<Date>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .api
            .add_item(AddItemRequest {
                product_id,
                quantity,
                preorder_delivery_date,
            })
            .await?;

        self.snapshot.lines.retain(|l| l.product_id != product_id);
        self.snapshot.lines.push(line);

        Ok(())
    }

    /// Change a line's quantity.
    ///
    /// Rejects `quantity == 0` before any network call; deletion must go
    /// through [`Self::remove_item`].
    pub async fn update_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .api
            .update_item(product_id, UpdateItemRequest { quantity })
            .await?;

        if let Some(cached) = self
            .snapshot
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
        {
            *cached = line;
        } else {
            self.snapshot.lines.push(line);
        }

        Ok(())
    }

    /// Remove a line from the cart.
    pub async fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        self.api.remove_item(product_id).await?;

        self.snapshot.lines.retain(|l| l.product_id != product_id);

        Ok(())
    }

    /// Empty the cart.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.api.clear_cart().await?;

        self.snapshot.lines.clear();

        Ok(())
    }

    /// Request a fresh hold for a line nearing expiry.
    ///
    /// Idempotent from the caller's perspective: extending an already-fresh
    /// line just refreshes it again. Fails with
    /// [`ApiError::ReservationNotFound`] when the hold was reclaimed
    /// server-side; the stale line stays cached until the next [`Self::load`].
    pub async fn extend_reservation(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let line = self.api.extend_reservation(product_id).await?;

        if let Some(cached) = self
            .snapshot
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
        {
            *cached = line;
        } else {
            self.snapshot.lines.push(line);
        }

        Ok(())
    }

    /// Seller-grouped view of the cache. Pure projection, recomputed on
    /// every call.
    #[must_use]
    pub fn groups(&self) -> Vec<SellerGroup> {
        group_by_seller(&self.snapshot.lines)
    }

    /// Reservation status of every cached line at `now`.
    #[must_use]
    pub fn line_statuses(&self, now: Timestamp) -> Vec<(ProductId, ReservationStatus)> {
        let clock = self.snapshot.clock();

        self.snapshot
            .lines
            .iter()
            .map(|line| (line.product_id, clock.status(line.reserved_at, now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use peony::cart::CartLine;
    use peony::ids::SellerId;
    use testresult::TestResult;

    use crate::api::MockShopApi;

    use super::*;

    fn line(product: u64, seller: u64, quantity: u32, reserved_at: Option<Timestamp>) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            name: format!("Bouquet {product}"),
            price: 100_00,
            quantity,
            photo_id: None,
            reserved_at,
            preorder_delivery_date: None,
        }
    }

    fn snapshot(lines: Vec<CartLine>) -> CartSnapshot {
        CartSnapshot {
            lines,
            reservation_ttl_seconds: 300,
        }
    }

    #[tokio::test]
    async fn load_replaces_cache_wholesale() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .times(2)
            .returning(|| Ok(snapshot(vec![line(1, 10, 1, Some(Timestamp::now()))])));

        let mut service = CartService::new(Arc::new(api));

        service.load().await?;
        assert_eq!(service.snapshot().lines.len(), 1);

        // A second load replaces, never merges.
        service.load().await?;
        assert_eq!(service.snapshot().lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_replaces_existing_line_for_product() -> TestResult {
        let fresh = Timestamp::now();

        let mut api = MockShopApi::new();
        let stale = fresh - SignedDuration::from_secs(100);
        api.expect_fetch_cart()
            .return_once(move || Ok(snapshot(vec![line(5, 10, 1, Some(stale))])));
        api.expect_add_item()
            .withf(|request| request.quantity == 3)
            .return_once(move |_| Ok(line(5, 10, 3, Some(fresh))));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        service.add_item(ProductId::new(5), 3, None).await?;

        assert_eq!(service.snapshot().lines.len(), 1);
        let cached = service.snapshot().lines.first();
        assert_eq!(cached.map(|l| l.quantity), Some(3));
        assert_eq!(cached.and_then(|l| l.reserved_at), Some(fresh));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_out_of_stock_leaves_cache_unchanged() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .return_once(|| Ok(snapshot(vec![line(1, 10, 1, Some(Timestamp::now()))])));
        api.expect_add_item()
            .return_once(|_| Err(ApiError::OutOfStock));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;
        let before = service.snapshot().clone();

        let result = service.add_item(ProductId::new(5), 3, None).await;

        assert!(
            matches!(result, Err(CartError::Api(ApiError::OutOfStock))),
            "expected OutOfStock, got {result:?}"
        );
        assert_eq!(service.snapshot(), &before);

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_zero_rejected_before_network() {
        let mut api = MockShopApi::new();
        api.expect_update_item().times(0);

        let mut service = CartService::new(Arc::new(api));

        let result = service.update_item(ProductId::new(7), 0).await;

        assert!(
            matches!(result, Err(CartError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );
    }

    #[tokio::test]
    async fn update_item_refreshes_cached_line() -> TestResult {
        let reserved = Timestamp::now();

        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .return_once(move || Ok(snapshot(vec![line(7, 10, 1, Some(reserved))])));
        api.expect_update_item()
            .withf(|product_id, request| *product_id == ProductId::new(7) && request.quantity == 4)
            .return_once(move |_, _| Ok(line(7, 10, 4, Some(reserved))));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        service.update_item(ProductId::new(7), 4).await?;

        let cached = service.snapshot().lines.first();
        assert_eq!(cached.map(|l| l.quantity), Some(4));

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_drops_line_after_confirmation() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_fetch_cart().return_once(|| {
            Ok(snapshot(vec![
                line(1, 10, 1, Some(Timestamp::now())),
                line(2, 10, 1, Some(Timestamp::now())),
            ]))
        });
        api.expect_remove_item()
            .withf(|product_id| *product_id == ProductId::new(1))
            .return_once(|_| Ok(()));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        service.remove_item(ProductId::new(1)).await?;

        assert_eq!(service.snapshot().lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn clear_failure_keeps_lines() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .return_once(|| Ok(snapshot(vec![line(1, 10, 1, None)])));
        api.expect_clear_cart().return_once(|| {
            Err(ApiError::Unexpected {
                status: 500,
                message: String::new(),
            })
        });

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        let result = service.clear().await;

        assert!(result.is_err(), "clear should fail");
        assert_eq!(service.snapshot().lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn extend_reservation_strictly_increases_reserved_at() -> TestResult {
        let old = Timestamp::now() - SignedDuration::from_secs(250);
        let fresh = Timestamp::now();

        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .return_once(move || Ok(snapshot(vec![line(1, 10, 1, Some(old))])));
        api.expect_extend_reservation()
            .return_once(move |_| Ok(line(1, 10, 1, Some(fresh))));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        service.extend_reservation(ProductId::new(1)).await?;

        let renewed = service
            .snapshot()
            .lines
            .first()
            .and_then(|l| l.reserved_at);
        assert!(
            renewed > Some(old),
            "extension must move reserved_at forward"
        );

        Ok(())
    }

    #[tokio::test]
    async fn extend_reservation_not_found_surfaces_and_keeps_cache() -> TestResult {
        let old = Timestamp::now() - SignedDuration::from_secs(250);

        let mut api = MockShopApi::new();
        api.expect_fetch_cart()
            .return_once(move || Ok(snapshot(vec![line(1, 10, 1, Some(old))])));
        api.expect_extend_reservation()
            .return_once(|_| Err(ApiError::ReservationNotFound));

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;
        let before = service.snapshot().clone();

        let result = service.extend_reservation(ProductId::new(1)).await;

        assert!(
            matches!(result, Err(CartError::Api(ApiError::ReservationNotFound))),
            "expected ReservationNotFound, got {result:?}"
        );
        assert_eq!(service.snapshot(), &before);

        Ok(())
    }

    #[tokio::test]
    async fn groups_projection_matches_lines() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_fetch_cart().return_once(|| {
            Ok(snapshot(vec![
                line(1, 10, 1, None),
                line(2, 20, 1, None),
                line(3, 10, 1, None),
            ]))
        });

        let mut service = CartService::new(Arc::new(api));
        service.load().await?;

        let groups = service.groups();

        assert_eq!(groups.len(), 2);
        let total_lines: usize = groups.iter().map(|g| g.lines.len()).sum();
        assert_eq!(total_lines, 3);

        Ok(())
    }
}
