//! Coupon evaluation and order totals.
//!
//! Everything here is a pure function over values already fetched from the database; the pricing
//! policy itself arrives as an explicitly constructed [`PricingConfig`] rather than ambient
//! global state.
use bps_common::Money;
use thiserror::Error;

use crate::db_types::Coupon;

/// The pricing policy applied to every checkout: tax rate in basis points, applied to
/// `subtotal - discount`, and a flat shipping fee. Loaded from the settings table and passed in
/// explicitly; never ambient state.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub tax_rate_bps: i64,
    pub shipping_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { tax_rate_bps: 1_000, shipping_fee: Money::from_cents(500) }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CouponError {
    #[error("Coupon #{0} is misconfigured: exactly one of percent_off and amount_off must be set")]
    Misconfigured(i64),
}

/// Computes the discount a coupon grants on the given subtotal.
///
/// * No coupon, or an inactive one: zero. (Order creation rejects inactive *codes* before it gets
///   here; a coupon deactivated mid-flight simply stops discounting.)
/// * `percent_off`: `subtotal * pct / 100`, rounded half-up, clamped to `[0, subtotal]`.
/// * `amount_off`: `min(amount_off, subtotal)`, floored at zero.
/// * Both or neither field set is a configuration error and is reported, not resolved silently.
pub fn discount_for(subtotal: Money, coupon: Option<&Coupon>) -> Result<Money, CouponError> {
    let coupon = match coupon {
        Some(c) => c,
        None => return Ok(Money::ZERO),
    };
    if !coupon.active {
        return Ok(Money::ZERO);
    }
    match (coupon.percent_off, coupon.amount_off) {
        (Some(pct), None) => Ok(subtotal.percent(pct).clamp_to(subtotal)),
        (None, Some(amount)) => Ok(amount.clamp_to(subtotal)),
        (Some(_), Some(_)) | (None, None) => Err(CouponError::Misconfigured(coupon.id)),
    }
}

//--------------------------------------    OrderTotals      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Derives the order totals from a subtotal and discount. Tax is charged on
/// `subtotal - discount` (the post-discount amount), at basis-point precision with half-up
/// rounding; shipping is the flat configured fee. The returned value satisfies
/// `total == subtotal - discount + tax + shipping` by construction.
pub fn compute_totals(subtotal: Money, discount: Money, pricing: &PricingConfig) -> OrderTotals {
    let tax = (subtotal - discount).basis_points(pricing.tax_rate_bps);
    let shipping = pricing.shipping_fee;
    OrderTotals { subtotal, discount, tax, shipping, total: subtotal - discount + tax + shipping }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn coupon(percent_off: Option<i64>, amount_off: Option<Money>) -> Coupon {
        Coupon {
            id: 42,
            code: "TEST".to_string(),
            percent_off,
            amount_off,
            active: true,
            gateway_coupon_id: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_coupon_means_no_discount() {
        assert_eq!(discount_for(Money::from_cents(2500), None).unwrap(), Money::ZERO);
    }

    #[test]
    fn inactive_coupon_means_no_discount() {
        let mut c = coupon(Some(20), None);
        c.active = false;
        assert_eq!(discount_for(Money::from_cents(2500), Some(&c)).unwrap(), Money::ZERO);
    }

    #[test]
    fn percent_off_rounds_half_up_and_clamps() {
        let c = coupon(Some(20), None);
        assert_eq!(discount_for(Money::from_cents(2500), Some(&c)).unwrap(), Money::from_cents(500));
        // percent_off = 100 takes exactly the subtotal, never more
        let c = coupon(Some(100), None);
        assert_eq!(discount_for(Money::from_cents(2500), Some(&c)).unwrap(), Money::from_cents(2500));
    }

    #[test]
    fn amount_off_is_capped_at_subtotal() {
        let c = coupon(None, Some(Money::from_cents(9_999)));
        assert_eq!(discount_for(Money::from_cents(2500), Some(&c)).unwrap(), Money::from_cents(2500));
        let c = coupon(None, Some(Money::from_cents(300)));
        assert_eq!(discount_for(Money::from_cents(2500), Some(&c)).unwrap(), Money::from_cents(300));
    }

    #[test]
    fn misconfigured_coupons_are_reported() {
        let both = coupon(Some(10), Some(Money::from_cents(100)));
        assert!(matches!(discount_for(Money::from_cents(2500), Some(&both)), Err(CouponError::Misconfigured(42))));
        let neither = coupon(None, None);
        assert!(matches!(discount_for(Money::from_cents(2500), Some(&neither)), Err(CouponError::Misconfigured(42))));
    }

    #[test]
    fn totals_satisfy_the_invariant() {
        let pricing = PricingConfig::default();
        // The canonical worked example: $25.00 cart, no coupon, 10% tax, $5.00 shipping.
        let totals = compute_totals(Money::from_cents(2500), Money::ZERO, &pricing);
        assert_eq!(totals.tax, Money::from_cents(250));
        assert_eq!(totals.total, Money::from_cents(3250));
        // With a 20% coupon the tax base drops to $20.00.
        let totals = compute_totals(Money::from_cents(2500), Money::from_cents(500), &pricing);
        assert_eq!(totals.tax, Money::from_cents(200));
        assert_eq!(totals.total, Money::from_cents(2700));
        assert_eq!(totals.total, totals.subtotal - totals.discount + totals.tax + totals.shipping);
    }
}
