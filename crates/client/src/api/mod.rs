//! Typed HTTP client for the Peony backend.
//!
//! [`ShopApi`] is the seam the services depend on; [`HttpShopApi`] is the
//! live reqwest adapter. Tests run against the generated [`MockShopApi`].

use async_trait::async_trait;
use mockall::automock;
use peony::{
    cart::{CartLine, CartSnapshot},
    checkout::{CheckoutForm, GuestCheckoutForm},
    ids::{ProductId, SellerId},
};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

pub mod models;

mod errors;

pub use errors::ApiError;

use crate::api::{
    errors::{error_from_response, payment_error_from_response},
    models::{
        AddItemRequest, CartResponse, CheckoutResponse, DaySlots, DeliveryCheckRequest,
        DeliveryCheckResponse, PaymentRequest, PaymentResponse, UpdateItemRequest,
    },
};

/// Backend operations consumed by the cart and checkout services.
#[automock]
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// `GET /buyers/me/cart` — the full seller-grouped cart snapshot.
    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError>;

    /// `POST /buyers/me/cart/items` — add a line and reserve stock.
    async fn add_item(&self, request: AddItemRequest) -> Result<CartLine, ApiError>;

    /// `PUT /buyers/me/cart/items/{id}` — change a line's quantity.
    async fn update_item(
        &self,
        product_id: ProductId,
        request: UpdateItemRequest,
    ) -> Result<CartLine, ApiError>;

    /// `DELETE /buyers/me/cart/items/{id}`.
    async fn remove_item(&self, product_id: ProductId) -> Result<(), ApiError>;

    /// `DELETE /buyers/me/cart`.
    async fn clear_cart(&self) -> Result<(), ApiError>;

    /// `POST /buyers/me/cart/items/{id}/extend-reservation` — refresh a hold.
    async fn extend_reservation(&self, product_id: ProductId) -> Result<CartLine, ApiError>;

    /// `POST /public/sellers/{id}/check-delivery` — zone check.
    async fn check_delivery(
        &self,
        seller_id: SellerId,
        request: DeliveryCheckRequest,
    ) -> Result<DeliveryCheckResponse, ApiError>;

    /// `GET /public/sellers/{id}/delivery-slots`.
    async fn delivery_slots(&self, seller_id: SellerId) -> Result<Vec<DaySlots>, ApiError>;

    /// `POST /buyers/me/cart/checkout` — registered multi-order placement.
    async fn checkout(&self, form: CheckoutForm) -> Result<CheckoutResponse, ApiError>;

    /// `POST /orders/guest-checkout` — guest placement with items inlined.
    async fn guest_checkout(&self, form: GuestCheckoutForm) -> Result<CheckoutResponse, ApiError>;

    /// `POST /payments/create`.
    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse, ApiError>;

    /// `POST /payments/guest/create`.
    async fn create_guest_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResponse, ApiError>;
}

/// Connection settings for the live adapter.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `"https://api.peony.example"`.
    pub base_url: String,

    /// Buyer bearer token; `None` for guest-only usage.
    pub auth_token: Option<String>,
}

/// Live HTTP adapter for [`ShopApi`].
#[derive(Debug, Clone)]
pub struct HttpShopApi {
    config: ApiConfig,
    http: Client,
}

impl HttpShopApi {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
        let response = self
            .authed(self.http.get(self.url("/buyers/me/cart")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: CartResponse = response.json().await?;

        Ok(parsed.into())
    }

    async fn add_item(&self, request: AddItemRequest) -> Result<CartLine, ApiError> {
        debug!(product_id = %request.product_id, quantity = request.quantity, "adding cart item");

        let response = self
            .authed(self.http.post(self.url("/buyers/me/cart/items")))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn update_item(
        &self,
        product_id: ProductId,
        request: UpdateItemRequest,
    ) -> Result<CartLine, ApiError> {
        let url = self.url(&format!("/buyers/me/cart/items/{product_id}"));

        let response = self.authed(self.http.put(url)).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn remove_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        let url = self.url(&format!("/buyers/me/cart/items/{product_id}"));

        let response = self.authed(self.http.delete(url)).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        let response = self
            .authed(self.http.delete(self.url("/buyers/me/cart")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }

    async fn extend_reservation(&self, product_id: ProductId) -> Result<CartLine, ApiError> {
        let url = self.url(&format!(
            "/buyers/me/cart/items/{product_id}/extend-reservation"
        ));

        let response = self.authed(self.http.post(url)).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn check_delivery(
        &self,
        seller_id: SellerId,
        request: DeliveryCheckRequest,
    ) -> Result<DeliveryCheckResponse, ApiError> {
        let url = self.url(&format!("/public/sellers/{seller_id}/check-delivery"));

        let response = self.http.post(url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn delivery_slots(&self, seller_id: SellerId) -> Result<Vec<DaySlots>, ApiError> {
        let url = self.url(&format!("/public/sellers/{seller_id}/delivery-slots"));

        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn checkout(&self, form: CheckoutForm) -> Result<CheckoutResponse, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/buyers/me/cart/checkout")))
            .json(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn guest_checkout(&self, form: GuestCheckoutForm) -> Result<CheckoutResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/orders/guest-checkout"))
            .json(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/payments/create")))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(payment_error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn create_guest_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/payments/guest/create"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(payment_error_from_response(response).await);
        }

        Ok(response.json().await?)
    }
}
