//! Domain types for carts and the layout they take in the key-value store.

pub mod errors;
pub mod item;
pub mod cart;

pub use cart::Cart;
pub use item::Item;
