use uuid::Uuid;

use crate::domain::cart::{self, CartLineItem, CartState, SelectedOptions};

use super::storage::LocalStorage;

pub const CART_KEY: &str = "cart-items";

/// Cart state persisted to local storage after every mutation.
///
/// Storage failures never reach the caller: a broken or missing saved cart
/// loads as empty, and a failed write is logged while the in-memory change
/// stands.
pub struct CartStore<S> {
    storage: S,
    items: Vec<CartLineItem>,
}

impl<S: LocalStorage> CartStore<S> {
    pub fn load(storage: S) -> Self {
        let items = match storage.get_item(CART_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
                Ok(saved) => normalized(saved),
                Err(e) => {
                    log::warn!("Discarding unreadable saved cart: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Could not read saved cart: {e}");
                Vec::new()
            }
        };
        Self { storage, items }
    }

    pub fn state(&self) -> CartState {
        CartState::from_items(&self.items)
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_item(&mut self, item: CartLineItem) {
        if cart::add_line(&mut self.items, item) {
            self.persist();
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid, options: Option<&SelectedOptions>) {
        if cart::remove_lines(&mut self.items, product_id, options) {
            self.persist();
        }
    }

    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i64,
        options: Option<&SelectedOptions>,
    ) {
        if cart::set_quantity(&mut self.items, product_id, quantity, options) {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set_item(CART_KEY, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            log::warn!("Failed to save cart: {e}");
        }
    }
}

/// Re-adds saved lines one by one so zero-quantity lines are dropped and
/// repeated identity keys are merged.
fn normalized(saved: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut items = Vec::with_capacity(saved.len());
    for item in saved {
        cart::add_line(&mut items, item);
    }
    items
}
