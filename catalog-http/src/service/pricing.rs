//! Item pricing behind the `new-pricing-strategy` flag

pub const NEW_PRICING_FLAG: &str = "new-pricing-strategy";

/// Multiplier applied to the base price while the new pricing is active
pub const DISCOUNT_FACTOR: f64 = 0.9;

/// Rounds to two decimals, halfway cases away from zero.
///
/// The rounding works on the binary value of `value * 100.0`, so
/// `17.9955` becomes `18.0` and `0.125` becomes `0.13`. This differs from
/// round-half-to-even on the exact decimal value, which gives `0.12` for
/// `0.125` and `2.67` for `2.675`; here `2.675` quotes `2.68`.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns the price to quote for an item
pub fn quoted_price(price: f64, new_pricing: bool) -> f64 {
    if new_pricing {
        round_to_cents(price * DISCOUNT_FACTOR)
    } else {
        price
    }
}
