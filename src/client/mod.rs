//! Shopper-side state: cart, favorites and checkout submission.

pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod storage;

pub use cart::CartStore;
pub use checkout::{Checkout, CheckoutDetails, CheckoutError, HttpOrderGateway, OrderGateway};
pub use favorites::FavoritesStore;
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
