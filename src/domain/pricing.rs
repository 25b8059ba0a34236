//! Checkout pricing: shipping, tax, promo discount and the order total.
//!
//! Tax is charged on the subtotal before any promo discount is taken off.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;
use thiserror::Error;

use super::cart::CartState;
use super::order::to_cents;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Please enter a promo code")]
    EmptyCode,
    #[error("Invalid promo code")]
    UnknownCode(String),
}

/// Known promo codes and the fraction of the subtotal they take off.
const PROMO_TABLE: &[(&str, &str)] = &[("DISCOUNT20", "0.20")];

#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode {
    pub code: String,
    pub discount_fraction: BigDecimal,
}

impl PromoCode {
    /// Looks a code up case-insensitively. Whitespace is not stripped, so
    /// `" DISCOUNT20"` is unknown; an all-blank input counts as empty.
    pub fn lookup(raw: &str) -> Result<Self, PricingError> {
        if raw.trim().is_empty() {
            return Err(PricingError::EmptyCode);
        }
        let code = raw.to_uppercase();
        PROMO_TABLE
            .iter()
            .find(|(known, _)| *known == code)
            .and_then(|(known, fraction)| {
                BigDecimal::from_str(fraction).ok().map(|discount_fraction| PromoCode {
                    code: (*known).to_string(),
                    discount_fraction,
                })
            })
            .ok_or(PricingError::UnknownCode(code))
    }

    pub fn discount_on(&self, subtotal: &BigDecimal) -> BigDecimal {
        subtotal * &self.discount_fraction
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    pub free_shipping_threshold: BigDecimal,
    pub flat_shipping: BigDecimal,
    pub tax_rate: BigDecimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: BigDecimal::from(50),
            flat_shipping: BigDecimal::new(599.into(), 2),
            tax_rate: BigDecimal::new(8.into(), 2),
        }
    }
}

impl PricingPolicy {
    /// Shipping is free only strictly above the threshold.
    pub fn shipping(&self, subtotal: &BigDecimal) -> BigDecimal {
        if *subtotal > self.free_shipping_threshold {
            BigDecimal::zero()
        } else {
            self.flat_shipping.clone()
        }
    }

    pub fn tax(&self, subtotal: &BigDecimal) -> BigDecimal {
        subtotal * &self.tax_rate
    }

    pub fn summarize(&self, subtotal: &BigDecimal, discount: &BigDecimal) -> OrderSummary {
        let shipping = self.shipping(subtotal);
        let tax = self.tax(subtotal);
        let total = subtotal + &shipping + &tax - discount;
        OrderSummary {
            subtotal: subtotal.clone(),
            shipping,
            tax,
            discount: discount.clone(),
            total,
        }
    }

    /// Prices a cart. An empty cart has no summary.
    pub fn summarize_cart(&self, cart: &CartState, promo: Option<&PromoCode>) -> Option<OrderSummary> {
        if cart.is_empty() {
            return None;
        }
        let discount = promo
            .map(|p| p.discount_on(&cart.subtotal))
            .unwrap_or_else(BigDecimal::zero);
        Some(self.summarize(&cart.subtotal, &discount))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub tax: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
}

impl OrderSummary {
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// Every amount rounded half-up to whole cents.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: to_cents(&self.subtotal),
            shipping: to_cents(&self.shipping),
            tax: to_cents(&self.tax),
            discount: to_cents(&self.discount),
            total: to_cents(&self.total),
        }
    }
}
