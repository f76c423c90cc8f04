//! Cart operations on top of a [`ListStore`](crate::storage::ListStore).

pub mod service;

pub use service::CartService;
