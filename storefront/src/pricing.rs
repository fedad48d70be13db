// storefront/src/pricing.rs

//! Cart price arithmetic. Prices are stored in integer cents; displayed
//! totals are currency units rounded to two decimals.

/// Unit price in (possibly fractional) cents after the product discount.
pub fn unit_price_cents(price_cents: i64, discount_percent: i32) -> f64 {
  let price = price_cents as f64;
  if discount_percent > 0 {
    price * (1.0 - f64::from(discount_percent) / 100.0)
  } else {
    price
  }
}

pub fn cents_to_units(cents: f64) -> f64 {
  cents / 100.0
}

pub fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// Server-side total over `(price_cents, discount_percent, quantity)` lines.
pub fn cart_total(lines: impl IntoIterator<Item = (i64, i32, i32)>) -> f64 {
  let cents: f64 = lines
    .into_iter()
    .map(|(price, discount, qty)| unit_price_cents(price, discount) * f64::from(qty))
    .sum();
  round2(cents_to_units(cents))
}

/// Guest total over `(price_cents, quantity)` lines. No discount is applied on this path.
pub fn guest_total(lines: impl IntoIterator<Item = (i64, i32)>) -> f64 {
  let cents: f64 = lines.into_iter().map(|(price, qty)| price as f64 * f64::from(qty)).sum();
  round2(cents_to_units(cents))
}

/// Whole-cent unit price frozen onto an order line.
pub fn order_unit_price_cents(price_cents: i64, discount_percent: i32) -> i64 {
  unit_price_cents(price_cents, discount_percent).round() as i64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn discount_applies_only_when_positive() {
    assert_eq!(unit_price_cents(10_000, 20), 8_000.0);
    assert_eq!(unit_price_cents(10_000, 0), 10_000.0);
    assert_eq!(unit_price_cents(10_000, -5), 10_000.0);
  }

  #[test]
  fn authenticated_and_guest_totals_differ_by_the_discount() {
    assert_eq!(cart_total([(10_000, 20, 3)]), 240.00);
    assert_eq!(guest_total([(10_000, 3)]), 300.00);
  }

  #[test]
  fn totals_round_to_two_decimals() {
    // 999 cents at 33% off is 669.33 cents per unit.
    assert_eq!(cart_total([(999, 33, 1)]), 6.69);
    assert_eq!(order_unit_price_cents(999, 33), 669);
  }

  #[test]
  fn empty_cart_totals_zero() {
    assert_eq!(cart_total(Vec::new()), 0.0);
    assert_eq!(guest_total(Vec::new()), 0.0);
  }
}
