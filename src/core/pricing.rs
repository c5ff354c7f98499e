//! Order pricing - subtotal, shipping, VAT, coupon discount and total.
//!
//! All constants come from [`PricingConfig`]. Amounts are plain `f64` currency units,
//! matching how the catalog publishes prices.

use crate::config::settings::PricingConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A purchasable item from the externally loaded catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item id referenced by the cart
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
}

/// Looks up an item in the catalog by id.
#[must_use]
pub fn find_item<'a>(items: &'a [CatalogItem], item_id: &str) -> Option<&'a CatalogItem> {
    items.iter().find(|item| item.id == item_id)
}

/// Shipping charged for a subtotal. Free only strictly above the threshold.
#[must_use]
pub fn shipping_for(subtotal: f64, config: &PricingConfig) -> f64 {
    if subtotal > config.free_shipping_threshold {
        0.0
    } else {
        config.shipping_cost
    }
}

/// VAT charged on a subtotal.
#[must_use]
pub fn tax_for(subtotal: f64, config: &PricingConfig) -> f64 {
    subtotal * config.vat_rate
}

/// Coupon entry state on the cart and checkout pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponState {
    /// Discount currently applied
    pub discount: f64,
    /// Message for the last rejected code
    pub error: Option<String>,
}

impl CouponState {
    /// Applies a coupon code to `subtotal`.
    ///
    /// The configured code is matched case-insensitively. A match sets the discount
    /// and clears the error; anything else records an error and keeps whatever
    /// discount was already applied.
    pub fn apply(&mut self, code: &str, subtotal: f64, config: &PricingConfig) -> bool {
        if code.trim().eq_ignore_ascii_case(&config.coupon_code) {
            self.discount = subtotal * config.coupon_rate;
            self.error = None;
            debug!("Coupon applied, discount {:.2}", self.discount);
            true
        } else {
            self.error = Some("Invalid coupon code".to_string());
            false
        }
    }
}

/// Full price breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    /// Sum of line totals
    pub subtotal: f64,
    /// Shipping charge
    pub shipping: f64,
    /// VAT on the subtotal
    pub tax: f64,
    /// Coupon discount
    pub discount: f64,
    /// subtotal + shipping + tax - discount, never below zero
    pub total: f64,
}

impl OrderTotals {
    /// Derives shipping, tax and total from a subtotal and the applied discount.
    ///
    /// The discount is fixed when the coupon is applied, so a cart reduced afterwards
    /// can be worth less than the discount; the total then bottoms out at zero.
    #[must_use]
    pub fn compute(subtotal: f64, discount: f64, config: &PricingConfig) -> Self {
        let shipping = shipping_for(subtotal, config);
        let tax = tax_for(subtotal, config);
        Self {
            subtotal,
            shipping,
            tax,
            discount,
            total: (subtotal + shipping + tax - discount).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn config() -> PricingConfig {
        PricingConfig {
            vat_rate: 0.15,
            shipping_cost: 30.0,
            free_shipping_threshold: 200.0,
            coupon_code: "DISCOUNT20".to_string(),
            coupon_rate: 0.20,
        }
    }

    #[test]
    fn test_shipping_threshold_is_exclusive() {
        assert_eq!(shipping_for(250.0, &config()), 0.0);
        assert_eq!(shipping_for(200.0, &config()), 30.0);
        assert_eq!(shipping_for(0.0, &config()), 30.0);
    }

    #[test]
    fn test_tax() {
        assert!((tax_for(1000.0, &config()) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_coupon_any_case() {
        let mut coupon = CouponState {
            discount: 0.0,
            error: Some("Invalid coupon code".to_string()),
        };
        assert!(coupon.apply("discount20", 500.0, &config()));
        assert_eq!(coupon.discount, 100.0);
        assert_eq!(coupon.error, None);
    }

    #[test]
    fn test_wrong_coupon_keeps_discount() {
        let mut coupon = CouponState::default();
        assert!(coupon.apply("Discount20", 500.0, &config()));

        assert!(!coupon.apply("WRONG", 500.0, &config()));
        assert_eq!(coupon.discount, 100.0);
        assert!(coupon.error.is_some());

        let mut fresh = CouponState::default();
        assert!(!fresh.apply("WRONG", 500.0, &config()));
        assert_eq!(fresh.discount, 0.0);
    }

    #[test]
    fn test_order_totals() {
        let totals = OrderTotals::compute(500.0, 100.0, &config());
        assert_eq!(totals.shipping, 0.0);
        assert!((totals.tax - 75.0).abs() < 1e-9);
        assert!((totals.total - 475.0).abs() < 1e-9);

        let small = OrderTotals::compute(100.0, 0.0, &config());
        assert!((small.total - 145.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_item() {
        let items = vec![CatalogItem {
            id: "p-1".to_string(),
            name: "Notebook".to_string(),
            price: 12.5,
        }];
        assert_eq!(find_item(&items, "p-1").map(|i| i.price), Some(12.5));
        assert!(find_item(&items, "p-2").is_none());
    }

    #[test]
    fn test_total_never_negative() {
        let mut coupon = CouponState::default();
        assert!(coupon.apply("DISCOUNT20", 500.0, &config()));

        // cart cut down after the coupon was applied
        let totals = OrderTotals::compute(10.0, coupon.discount, &config());
        assert_eq!(totals.discount, 100.0);
        assert_eq!(totals.shipping, 30.0);
        assert_eq!(totals.total, 0.0);
    }
}
