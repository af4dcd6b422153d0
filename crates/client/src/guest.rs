//! Guest cart
//!
//! An unauthenticated buyer has no server-side cart and no reservations; the
//! lines live only in memory and travel inside the guest checkout request,
//! where the backend re-validates stock. The Cart Aggregate is bypassed
//! entirely.

use peony::{
    cart::{CartLine, SellerGroup, group_by_seller},
    ids::ProductId,
};
use thiserror::Error;

/// Errors from local guest-cart edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuestCartError {
    /// Quantity zero is invalid, not a deletion signal; use `remove`.
    #[error("quantity must be at least 1; use remove to delete a line")]
    InvalidQuantity,

    /// No line exists for the product.
    #[error("product not in cart")]
    NotFound,
}

/// Local-only, in-memory cart for the guest flow.
#[derive(Debug, Clone, Default)]
pub struct GuestCart {
    lines: Vec<CartLine>,
}

impl GuestCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line totals, in minor units.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Seller-grouped view; pure projection, recomputed per call.
    #[must_use]
    pub fn groups(&self) -> Vec<SellerGroup> {
        group_by_seller(&self.lines)
    }

    /// Add a line; adding a product already present accumulates its
    /// quantity. Guest lines never carry a reservation.
    ///
    /// # Errors
    ///
    /// [`GuestCartError::InvalidQuantity`] for `quantity == 0`.
    pub fn add(&mut self, mut line: CartLine) -> Result<(), GuestCartError> {
        if line.quantity == 0 {
            return Err(GuestCartError::InvalidQuantity);
        }

        line.reserved_at = None;

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }

        Ok(())
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// [`GuestCartError::InvalidQuantity`] for `quantity == 0`,
    /// [`GuestCartError::NotFound`] for an unknown product.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GuestCartError> {
        if quantity == 0 {
            return Err(GuestCartError::InvalidQuantity);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(GuestCartError::NotFound)?;

        line.quantity = quantity;

        Ok(())
    }

    /// Remove a line.
    pub fn remove(&mut self, product_id: ProductId) -> Result<(), GuestCartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            return Err(GuestCartError::NotFound);
        }

        Ok(())
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use peony::ids::SellerId;
    use testresult::TestResult;

    use super::*;

    fn line(product: u64, seller: u64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            name: format!("Bouquet {product}"),
            price: 120_00,
            quantity,
            photo_id: None,
            reserved_at: None,
            preorder_delivery_date: None,
        }
    }

    #[test]
    fn adding_same_product_accumulates_quantity() -> TestResult {
        let mut cart = GuestCart::new();

        cart.add(line(1, 10, 1))?;
        cart.add(line(1, 10, 2))?;

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines().first().map(|l| l.quantity), Some(3));

        Ok(())
    }

    #[test]
    fn add_quantity_zero_is_rejected() {
        let mut cart = GuestCart::new();

        let result = cart.add(line(1, 10, 0));

        assert_eq!(result, Err(GuestCartError::InvalidQuantity));
        assert!(cart.is_empty(), "rejected line must not be stored");
    }

    #[test]
    fn guest_lines_never_carry_reservations() -> TestResult {
        let mut cart = GuestCart::new();

        let mut reserved = line(1, 10, 1);
        reserved.reserved_at = Some(Timestamp::now());
        cart.add(reserved)?;

        assert_eq!(cart.lines().first().and_then(|l| l.reserved_at), None);

        Ok(())
    }

    #[test]
    fn update_quantity_zero_is_rejected() -> TestResult {
        let mut cart = GuestCart::new();
        cart.add(line(7, 10, 2))?;

        let result = cart.update_quantity(ProductId::new(7), 0);

        assert_eq!(result, Err(GuestCartError::InvalidQuantity));
        assert_eq!(cart.lines().first().map(|l| l.quantity), Some(2));

        Ok(())
    }

    #[test]
    fn remove_unknown_product_is_not_found() {
        let mut cart = GuestCart::new();

        assert_eq!(cart.remove(ProductId::new(9)), Err(GuestCartError::NotFound));
    }

    #[test]
    fn groups_and_totals() -> TestResult {
        let mut cart = GuestCart::new();
        cart.add(line(1, 10, 1))?;
        cart.add(line(2, 20, 2))?;

        assert_eq!(cart.groups().len(), 2);
        assert_eq!(cart.grand_total(), 360_00);

        cart.update_quantity(ProductId::new(2), 1)?;
        assert_eq!(cart.grand_total(), 240_00);

        cart.clear();
        assert!(cart.is_empty(), "clear removes everything");

        Ok(())
    }
}
