use std::sync::Arc;

use service::cart::CartService;

/// Shared handler state. Cloned per request; the cart service and its store
/// handle are shared behind `Arc`.
#[derive(Clone)]
pub struct ServerState {
    pub cart: Arc<CartService>,
}

impl ServerState {
    pub fn new(cart: CartService) -> Self {
        Self { cart: Arc::new(cart) }
    }
}
