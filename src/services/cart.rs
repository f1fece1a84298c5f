//! In-memory cart assembled before an order is committed.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product_id: i32,
    pub product_name: String,
    /// Price when the line was added; later catalog edits do not change it
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum CartState {
    Empty,
    Building,
}

/// Pending order lines. Adding the same product twice keeps two lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CartState {
        if self.lines.is_empty() {
            CartState::Empty
        } else {
            CartState::Building
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends a line priced at `unit_price`.
    pub fn push(
        &mut self,
        product_id: i32,
        product_name: impl Into<String>,
        unit_price: Decimal,
        quantity: i32,
    ) -> Result<&CartLine, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::validation("Quantity must be positive"));
        }

        self.lines.push(CartLine {
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price * Decimal::from(quantity),
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    pub fn remove_line(&mut self, index: usize) -> Result<CartLine, ServiceError> {
        if index >= self.lines.len() {
            return Err(ServiceError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    /// Sum of line subtotals, recomputed on every call.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.subtotal).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Quantity per product across all lines, in first-seen order.
    pub(crate) fn quantities_by_product(&self) -> Vec<(i32, i32)> {
        let mut totals: Vec<(i32, i32)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => totals.push((line.product_id, line.quantity)),
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_follows_the_lines() {
        let mut cart = Cart::new();
        assert_eq!(cart.state(), CartState::Empty);

        cart.push(1, "A", dec!(100), 2).unwrap();
        cart.push(2, "B", dec!(50), 1).unwrap();
        assert_eq!(cart.state(), CartState::Building);
        assert_eq!(cart.total(), dec!(250));
        assert_eq!(cart.lines()[0].subtotal, dec!(200));

        cart.remove_line(0).unwrap();
        assert_eq!(cart.total(), dec!(50));
    }

    #[test]
    fn same_product_twice_is_two_lines() {
        let mut cart = Cart::new();
        cart.push(7, "Comfort Slippers", dec!(499.99), 1).unwrap();
        cart.push(7, "Comfort Slippers", dec!(499.99), 2).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantities_by_product(), vec![(7, 3)]);
    }

    #[test]
    fn rejects_non_positive_quantities_and_bad_indexes() {
        let mut cart = Cart::new();
        assert_matches!(cart.push(1, "A", dec!(1), 0), Err(ServiceError::ValidationError(_)));
        assert_matches!(cart.push(1, "A", dec!(1), -3), Err(ServiceError::ValidationError(_)));
        assert!(cart.is_empty());

        cart.push(1, "A", dec!(1), 1).unwrap();
        assert_matches!(
            cart.remove_line(1),
            Err(ServiceError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut cart = Cart::new();
        cart.push(1, "A", dec!(10), 3).unwrap();
        cart.clear();
        assert_eq!(cart.state(), CartState::Empty);
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.len(), 0);
    }

    fn arb_line() -> impl Strategy<Value = (i32, i64, i32)> {
        (1..50i32, 0..1_000_000i64, 1..20i32)
    }

    proptest! {
        #[test]
        fn add_then_remove_restores_the_cart(
            existing in proptest::collection::vec(arb_line(), 0..8),
            added in arb_line(),
            position in any::<prop::sample::Index>(),
        ) {
            let mut cart = Cart::new();
            for (id, cents, qty) in &existing {
                cart.push(*id, "existing", Decimal::new(*cents, 2), *qty).unwrap();
            }
            let before_total = cart.total();
            let before_len = cart.len();

            let (id, cents, qty) = added;
            cart.push(id, "added", Decimal::new(cents, 2), qty).unwrap();
            let index = cart.len() - 1;
            cart.remove_line(index).unwrap();

            prop_assert_eq!(cart.total(), before_total);
            prop_assert_eq!(cart.len(), before_len);

            if !cart.is_empty() {
                let victim = position.index(cart.len());
                let removed = cart.remove_line(victim).unwrap();
                prop_assert_eq!(cart.total(), before_total - removed.subtotal);
            }
        }
    }
}
