//! Shopping cart line items and the aggregates derived from them.
//!
//! A cart is an ordered list of lines, unique by identity key
//! `(product_id, selected_options)`. Quantities are always at least one: a
//! line that would drop to zero is removed instead.

use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Option name to chosen value, e.g. `color -> "red"`.
pub type SelectedOptions = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub discount_percent: BigDecimal,
    pub quantity: u32,
    #[serde(default)]
    pub selected_options: SelectedOptions,
}

impl CartLineItem {
    pub fn new(product_id: Uuid, name: impl Into<String>, unit_price: BigDecimal, quantity: u32) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            discount_percent: BigDecimal::zero(),
            quantity,
            selected_options: SelectedOptions::new(),
        }
    }

    pub fn with_discount(mut self, percent: BigDecimal) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.selected_options.insert(name.into(), value.into());
        self
    }

    /// Unit price after this line's own discount.
    pub fn effective_price(&self) -> BigDecimal {
        if self.discount_percent > BigDecimal::zero() {
            let keep = BigDecimal::from(100) - &self.discount_percent;
            self.unit_price.clone() * keep / BigDecimal::from(100)
        } else {
            self.unit_price.clone()
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        self.effective_price() * BigDecimal::from(self.quantity)
    }

    pub fn same_line(&self, product_id: Uuid, options: &SelectedOptions) -> bool {
        self.product_id == product_id && &self.selected_options == options
    }

    /// Matches a line by product, and by options only when they are given.
    pub fn matches(&self, product_id: Uuid, options: Option<&SelectedOptions>) -> bool {
        match options {
            Some(options) => self.same_line(product_id, options),
            None => self.product_id == product_id,
        }
    }
}

/// Snapshot of a cart with its derived aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartLineItem>,
    pub item_count: u64,
    pub subtotal: BigDecimal,
}

impl CartState {
    pub fn from_items(items: &[CartLineItem]) -> Self {
        Self {
            items: items.to_vec(),
            item_count: item_count(items),
            subtotal: subtotal(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|i| u64::from(i.quantity)).sum()
}

pub fn subtotal(items: &[CartLineItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| acc + item.line_total())
}

/// Adds `item`, merging into an existing line with the same identity key.
/// Returns false when nothing changed.
pub fn add_line(items: &mut Vec<CartLineItem>, item: CartLineItem) -> bool {
    if item.quantity == 0 {
        return false;
    }
    match items
        .iter_mut()
        .find(|i| i.same_line(item.product_id, &item.selected_options))
    {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
        None => items.push(item),
    }
    true
}

/// Removes matching lines; without options every line of the product goes.
pub fn remove_lines(
    items: &mut Vec<CartLineItem>,
    product_id: Uuid,
    options: Option<&SelectedOptions>,
) -> bool {
    let before = items.len();
    items.retain(|i| !i.matches(product_id, options));
    items.len() != before
}

/// Sets the quantity of matching lines in place, or removes them when
/// `quantity <= 0`.
pub fn set_quantity(
    items: &mut Vec<CartLineItem>,
    product_id: Uuid,
    quantity: i64,
    options: Option<&SelectedOptions>,
) -> bool {
    if quantity <= 0 {
        return remove_lines(items, product_id, options);
    }
    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    let mut changed = false;
    for item in items.iter_mut().filter(|i| i.matches(product_id, options)) {
        item.quantity = quantity;
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn shirt(id: Uuid, size: &str, qty: u32) -> CartLineItem {
        CartLineItem::new(id, "T-shirt", dec("20.00"), qty).with_option("size", size)
    }

    #[test]
    fn repeated_adds_sum_quantities() {
        let id = Uuid::new_v4();
        let mut items = Vec::new();
        for qty in [1, 2, 4] {
            add_line(&mut items, shirt(id, "M", qty));
        }
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 7);
    }

    #[test]
    fn different_options_are_distinct_lines() {
        let id = Uuid::new_v4();
        let mut items = Vec::new();
        add_line(&mut items, shirt(id, "M", 1));
        add_line(&mut items, shirt(id, "L", 1));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn option_order_does_not_affect_identity() {
        let id = Uuid::new_v4();
        let a = CartLineItem::new(id, "Shoe", dec("50"), 1)
            .with_option("color", "red")
            .with_option("size", "9");
        let b = CartLineItem::new(id, "Shoe", dec("50"), 2)
            .with_option("size", "9")
            .with_option("color", "red");
        let mut items = Vec::new();
        add_line(&mut items, a);
        add_line(&mut items, b);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let mut items = Vec::new();
        assert!(!add_line(&mut items, shirt(Uuid::new_v4(), "M", 0)));
        assert!(items.is_empty());
    }

    #[test]
    fn remove_without_options_drops_every_variant() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut items = vec![shirt(id, "M", 1), shirt(other, "M", 1), shirt(id, "L", 3)];
        remove_lines(&mut items, id, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, other);
    }

    #[test]
    fn remove_with_options_drops_only_that_variant() {
        let id = Uuid::new_v4();
        let mut items = vec![shirt(id, "M", 1), shirt(id, "L", 3)];
        let large = shirt(id, "L", 1).selected_options;
        remove_lines(&mut items, id, Some(&large));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].selected_options.get("size").map(String::as_str), Some("M"));
    }

    #[test]
    fn update_to_zero_equals_remove() {
        let id = Uuid::new_v4();
        let base = vec![shirt(id, "M", 1), shirt(Uuid::new_v4(), "S", 2), shirt(id, "L", 3)];

        let mut updated = base.clone();
        set_quantity(&mut updated, id, 0, None);
        let mut removed = base;
        remove_lines(&mut removed, id, None);

        assert_eq!(updated, removed);
    }

    #[test]
    fn update_keeps_line_position() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut items = vec![shirt(a, "M", 1), shirt(b, "M", 1)];
        set_quantity(&mut items, a, 5, None);
        assert_eq!(items[0].product_id, a);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn subtotal_applies_line_discounts() {
        let items = vec![
            CartLineItem::new(Uuid::new_v4(), "Lamp", dec("40.00"), 2).with_discount(dec("25")),
            CartLineItem::new(Uuid::new_v4(), "Book", dec("12.50"), 1),
        ];
        // 40 * 0.75 * 2 + 12.50
        assert_eq!(subtotal(&items), dec("72.50"));
        assert_eq!(item_count(&items), 3);
    }

    #[test]
    fn subtotal_is_order_independent() {
        let mut items = vec![
            CartLineItem::new(Uuid::new_v4(), "A", dec("3.33"), 3).with_discount(dec("10")),
            CartLineItem::new(Uuid::new_v4(), "B", dec("19.99"), 1),
            CartLineItem::new(Uuid::new_v4(), "C", dec("0.01"), 7).with_discount(dec("50")),
        ];
        let forward = subtotal(&items);
        items.reverse();
        assert_eq!(subtotal(&items), forward);
    }
}
