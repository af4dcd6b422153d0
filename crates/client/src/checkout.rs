//! Checkout service
//!
//! Resolves delivery per seller, assembles the multi-order submission and
//! interprets the per-seller response. Submission is a single-shot call
//! guarded by an in-flight flag, mirroring a Pay button that disables itself
//! until the request settles.

use std::sync::Arc;

use jiff::Timestamp;
use peony::{
    cart::{CartSnapshot, group_by_seller},
    checkout::{
        AssembleError, ContactInfo, DeliverySlot, PointsUsage, SellerDelivery, assemble,
        assemble_guest,
    },
    ids::{DistrictId, OrderId, SellerId},
};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    api::{
        ApiError, ShopApi,
        models::{DaySlots, DeliveryCheckRequest, PaymentRequest, PlacedOrder},
    },
    guest::GuestCart,
};

/// Errors from delivery resolution, submission or payment.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A previous submission has not settled yet.
    #[error("a checkout submission is already in flight")]
    SubmissionInFlight,

    /// The seller does not deliver to the given address.
    #[error("seller {seller_id} does not deliver here: {message}")]
    DeliveryUnavailable { seller_id: SellerId, message: String },

    /// A slot was chosen for a seller with no delivery resolution.
    #[error("no delivery resolved for seller {seller_id}")]
    SlotWithoutDelivery { seller_id: SellerId },

    /// The payload could not be assembled.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// The backend created orders for only some submitted sellers. The
    /// client never retries on its own; the caller shows what was placed and
    /// reloads the cart.
    #[error("only {} of the submitted orders were placed", placed.len())]
    PartialPlacement {
        placed: Vec<PlacedOrder>,
        missing: Vec<SellerId>,
    },

    /// The backend call failed; prior local state is untouched.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The orders created by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub orders: Vec<PlacedOrder>,
}

impl CheckoutReceipt {
    /// Sum of all per-seller order totals, in minor units.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.orders.iter().map(|order| order.total_price).sum()
    }

    /// Ids of every placed order, for the payment call.
    #[must_use]
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|order| order.order_id).collect()
    }
}

/// Per-seller delivery resolution plus submission, for both buyer flows.
pub struct CheckoutService {
    api: Arc<dyn ShopApi>,
    deliveries: FxHashMap<SellerId, SellerDelivery>,
    submission_in_flight: bool,
    payment_in_flight: bool,
}

impl CheckoutService {
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>) -> Self {
        Self {
            api,
            deliveries: FxHashMap::default(),
            submission_in_flight: false,
            payment_in_flight: false,
        }
    }

    /// The current resolution for a seller, if any.
    #[must_use]
    pub fn delivery(&self, seller_id: SellerId) -> Option<&SellerDelivery> {
        self.deliveries.get(&seller_id)
    }

    /// Run the zone check for one seller and record the courier price.
    ///
    /// Each seller resolves independently: a pending check for one seller
    /// never blocks another seller's already-resolved delivery line. On
    /// failure nothing is recorded and any prior resolution stands.
    pub async fn resolve_delivery(
        &mut self,
        seller_id: SellerId,
        address: &str,
        district_id: Option<DistrictId>,
    ) -> Result<u64, CheckoutError> {
        let response = self
            .api
            .check_delivery(
                seller_id,
                DeliveryCheckRequest {
                    address: address.to_owned(),
                    district_id,
                },
            )
            .await?;

        let covered = response.delivers.then_some(response.delivery_price).flatten();

        let Some(price) = covered else {
            return Err(CheckoutError::DeliveryUnavailable {
                seller_id,
                message: response
                    .message
                    .unwrap_or_else(|| "address outside the delivery zones".to_owned()),
            });
        };

        debug!(%seller_id, price, "delivery zone resolved");

        // A re-resolution (new address) invalidates any previously chosen
        // slot for the seller.
        self.deliveries
            .insert(seller_id, SellerDelivery::courier(price, response.district_id));

        Ok(price)
    }

    /// Record pickup for a seller; no zone check needed.
    pub fn choose_pickup(&mut self, seller_id: SellerId) {
        self.deliveries.insert(seller_id, SellerDelivery::pickup());
    }

    /// Attach a delivery slot to an already-resolved seller.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::SlotWithoutDelivery`] when the seller has no delivery
    /// resolution to attach the slot to.
    pub fn choose_slot(
        &mut self,
        seller_id: SellerId,
        slot: DeliverySlot,
    ) -> Result<(), CheckoutError> {
        let Some(delivery) = self.deliveries.get_mut(&seller_id) else {
            return Err(CheckoutError::SlotWithoutDelivery { seller_id });
        };

        delivery.slot = Some(slot);

        Ok(())
    }

    /// Fetch a seller's per-date slot availability.
    pub async fn load_slots(&self, seller_id: SellerId) -> Result<Vec<DaySlots>, CheckoutError> {
        Ok(self.api.delivery_slots(seller_id).await?)
    }

    /// Assemble and submit the registered-buyer checkout.
    ///
    /// One order is expected per submitted seller group; a response covering
    /// only some of them yields [`CheckoutError::PartialPlacement`].
    pub async fn submit(
        &mut self,
        snapshot: &CartSnapshot,
        contact: &ContactInfo,
        points: &[PointsUsage],
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if self.submission_in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }

        let groups = group_by_seller(&snapshot.lines);
        let form = assemble(
            &groups,
            &self.deliveries,
            contact,
            points,
            &snapshot.clock(),
            Timestamp::now(),
        )?;

        let submitted: Vec<SellerId> = form
            .delivery_by_seller
            .iter()
            .map(|entry| entry.seller_id)
            .collect();

        self.submission_in_flight = true;
        let result = self.api.checkout(form).await;
        self.submission_in_flight = false;

        Self::interpret(&submitted, result?.orders)
    }

    /// Assemble and submit the guest checkout, with cart items inlined.
    pub async fn submit_guest(
        &mut self,
        cart: &GuestCart,
        contact: &ContactInfo,
        points: &[PointsUsage],
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if self.submission_in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }

        let form = assemble_guest(cart.lines(), &self.deliveries, contact, points)?;

        let submitted: Vec<SellerId> = form
            .form
            .delivery_by_seller
            .iter()
            .map(|entry| entry.seller_id)
            .collect();

        self.submission_in_flight = true;
        let result = self.api.guest_checkout(form).await;
        self.submission_in_flight = false;

        Self::interpret(&submitted, result?.orders)
    }

    /// Create the payment for placed orders and return the provider's
    /// confirmation URL for redirect.
    pub async fn pay(&mut self, order_ids: Vec<OrderId>) -> Result<String, CheckoutError> {
        if self.payment_in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }

        self.payment_in_flight = true;
        let result = self
            .api
            .create_payment(PaymentRequest {
                order_ids,
                return_url: None,
            })
            .await;
        self.payment_in_flight = false;

        Ok(result?.confirmation_url)
    }

    /// Guest variant of [`Self::pay`].
    pub async fn pay_guest(&mut self, order_ids: Vec<OrderId>) -> Result<String, CheckoutError> {
        if self.payment_in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }

        self.payment_in_flight = true;
        let result = self
            .api
            .create_guest_payment(PaymentRequest {
                order_ids,
                return_url: None,
            })
            .await;
        self.payment_in_flight = false;

        Ok(result?.confirmation_url)
    }

    fn interpret(
        submitted: &[SellerId],
        orders: Vec<PlacedOrder>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let missing: Vec<SellerId> = submitted
            .iter()
            .copied()
            .filter(|seller_id| !orders.iter().any(|order| order.seller_id == *seller_id))
            .collect();

        if missing.is_empty() {
            Ok(CheckoutReceipt { orders })
        } else {
            warn!(?missing, "backend placed only part of the submission");

            Err(CheckoutError::PartialPlacement {
                placed: orders,
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use peony::cart::CartLine;
    use peony::ids::ProductId;
    use testresult::TestResult;

    use crate::api::models::DeliveryCheckResponse;
    use crate::api::MockShopApi;

    use super::*;

    fn line(product: u64, seller: u64, price: u64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            name: format!("Bouquet {product}"),
            price,
            quantity: 1,
            photo_id: None,
            reserved_at: Some(Timestamp::now() - SignedDuration::from_secs(5)),
            preorder_delivery_date: None,
        }
    }

    fn snapshot(lines: Vec<CartLine>) -> CartSnapshot {
        CartSnapshot {
            lines,
            reservation_ttl_seconds: 300,
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            fio: "Анна Иванова".to_owned(),
            phone: "+79990001122".to_owned(),
            address: "Москва, Тверская 1".to_owned(),
            comment: String::new(),
            district_id: None,
            district_name: None,
        }
    }

    fn placed(order: u64, seller: u64, total: u64) -> PlacedOrder {
        PlacedOrder {
            order_id: OrderId::new(order),
            seller_id: SellerId::new(seller),
            total_price: total,
        }
    }

    #[tokio::test]
    async fn resolve_delivery_stores_price_per_seller() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_check_delivery()
            .withf(|seller_id, _| *seller_id == SellerId::new(10))
            .return_once(|_, _| {
                Ok(DeliveryCheckResponse {
                    delivers: true,
                    delivery_price: Some(350_00),
                    district_id: Some(DistrictId::new(3)),
                    message: None,
                })
            });

        let mut service = CheckoutService::new(Arc::new(api));

        let price = service
            .resolve_delivery(SellerId::new(10), "Тверская 1", None)
            .await?;

        assert_eq!(price, 350_00);
        let delivery = service.delivery(SellerId::new(10));
        assert_eq!(delivery.and_then(|d| d.price), Some(350_00));

        Ok(())
    }

    #[tokio::test]
    async fn uncovered_address_is_rejected_without_recording() {
        let mut api = MockShopApi::new();
        api.expect_check_delivery().return_once(|_, _| {
            Ok(DeliveryCheckResponse {
                delivers: false,
                delivery_price: None,
                district_id: None,
                message: Some("вне зоны доставки".to_owned()),
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));

        let result = service
            .resolve_delivery(SellerId::new(10), "далеко", None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::DeliveryUnavailable { .. })),
            "expected DeliveryUnavailable, got {result:?}"
        );
        assert!(service.delivery(SellerId::new(10)).is_none(), "nothing stored");
    }

    #[tokio::test]
    async fn one_pending_seller_never_blocks_a_resolved_one() -> TestResult {
        // Seller 10 resolved; seller 20 chose pickup while its zone check
        // would still be pending. Submission proceeds with both.
        let mut api = MockShopApi::new();
        api.expect_check_delivery().return_once(|_, _| {
            Ok(DeliveryCheckResponse {
                delivers: true,
                delivery_price: Some(200_00),
                district_id: None,
                message: None,
            })
        });
        api.expect_checkout().return_once(|form| {
            assert_eq!(form.delivery_by_seller.len(), 2);
            Ok(crate::api::models::CheckoutResponse {
                orders: vec![placed(1, 10, 300_00), placed(2, 20, 100_00)],
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));
        service
            .resolve_delivery(SellerId::new(10), "Тверская 1", None)
            .await?;
        service.choose_pickup(SellerId::new(20));

        let receipt = service
            .submit(
                &snapshot(vec![line(1, 10, 100_00), line(2, 20, 100_00)]),
                &contact(),
                &[],
            )
            .await?;

        assert_eq!(receipt.orders.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn slot_requires_prior_resolution() {
        let api = MockShopApi::new();
        let mut service = CheckoutService::new(Arc::new(api));

        let result = service.choose_slot(
            SellerId::new(10),
            DeliverySlot {
                date: jiff::civil::Date::constant(2026, 3, 8),
                time_from: "10:00".to_owned(),
                time_to: "14:00".to_owned(),
            },
        );

        assert!(
            matches!(result, Err(CheckoutError::SlotWithoutDelivery { .. })),
            "expected SlotWithoutDelivery, got {result:?}"
        );
    }

    #[tokio::test]
    async fn partial_placement_is_reported_not_swallowed() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_checkout().return_once(|_| {
            // Backend placed seller 10's order but rejected seller 20's.
            Ok(crate::api::models::CheckoutResponse {
                orders: vec![placed(1, 10, 100_00)],
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));
        service.choose_pickup(SellerId::new(10));
        service.choose_pickup(SellerId::new(20));

        let result = service
            .submit(
                &snapshot(vec![line(1, 10, 100_00), line(2, 20, 100_00)]),
                &contact(),
                &[],
            )
            .await;

        match result {
            Err(CheckoutError::PartialPlacement { placed, missing }) => {
                assert_eq!(placed.len(), 1);
                assert_eq!(missing, vec![SellerId::new(20)]);
            }
            other => panic!("expected PartialPlacement, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn submission_guard_resets_after_failure() -> TestResult {
        let mut api = MockShopApi::new();
        let mut sequence = mockall::Sequence::new();
        api.expect_checkout()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Err(ApiError::Unexpected {
                    status: 500,
                    message: String::new(),
                })
            });
        api.expect_checkout()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Ok(crate::api::models::CheckoutResponse {
                    orders: vec![placed(1, 10, 100_00)],
                })
            });

        let mut service = CheckoutService::new(Arc::new(api));
        service.choose_pickup(SellerId::new(10));

        let cart = snapshot(vec![line(1, 10, 100_00)]);

        let first = service.submit(&cart, &contact(), &[]).await;
        assert!(first.is_err(), "first submission fails");

        // The guard must have been released; re-triggering works.
        let second = service.submit(&cart, &contact(), &[]).await?;
        assert_eq!(second.orders.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn guest_checkout_totals_sum_to_grand_total() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_guest_checkout().return_once(|form| {
            assert_eq!(form.items.len(), 2);
            Ok(crate::api::models::CheckoutResponse {
                orders: vec![placed(1, 10, 150_00), placed(2, 20, 250_00)],
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));
        service.choose_pickup(SellerId::new(10));
        service.choose_pickup(SellerId::new(20));

        let mut guest = GuestCart::new();
        guest.add(guest_line(1, 10, 150_00))?;
        guest.add(guest_line(2, 20, 250_00))?;

        let receipt = service.submit_guest(&guest, &contact(), &[]).await?;

        assert_eq!(receipt.orders.len(), 2);
        assert_eq!(receipt.grand_total(), 400_00);
        assert_eq!(receipt.grand_total(), guest.grand_total());

        Ok(())
    }

    #[tokio::test]
    async fn payment_returns_confirmation_url() -> TestResult {
        let mut api = MockShopApi::new();
        api.expect_create_payment().return_once(|request| {
            assert_eq!(request.order_ids.len(), 2);
            Ok(crate::api::models::PaymentResponse {
                confirmation_url: "https://pay.example/confirm/abc".to_owned(),
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));

        let url = service
            .pay(vec![OrderId::new(1), OrderId::new(2)])
            .await?;

        assert_eq!(url, "https://pay.example/confirm/abc");

        Ok(())
    }

    #[tokio::test]
    async fn payment_failure_surfaces_as_payment_error() {
        let mut api = MockShopApi::new();
        api.expect_create_payment().return_once(|_| {
            Err(ApiError::Payment {
                message: "provider unavailable".to_owned(),
            })
        });

        let mut service = CheckoutService::new(Arc::new(api));

        let result = service.pay(vec![OrderId::new(1)]).await;

        assert!(
            matches!(result, Err(CheckoutError::Api(ApiError::Payment { .. }))),
            "expected Payment error, got {result:?}"
        );
    }

    fn guest_line(product: u64, seller: u64, price: u64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            name: format!("Bouquet {product}"),
            price,
            quantity: 1,
            photo_id: None,
            reserved_at: None,
            preorder_delivery_date: None,
        }
    }
}
