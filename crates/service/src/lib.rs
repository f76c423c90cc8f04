//! Service layer: the Store Adapter and the cart operations built on it.
//! - `storage` owns the connection to the key-value store.
//! - `cart` holds the read-modify-write protocol for add-item and view-cart.
//! - Errors are mapped to HTTP by the `server` crate.

pub mod errors;
pub mod storage;
pub mod cart;
pub mod metrics;
pub mod runtime;
