use std::sync::Arc;

use configs::CartConfig;
use models::{cart, errors::ModelError, Cart, Item};
use tracing::{debug, info, instrument, warn};

use crate::errors::ServiceError;
use crate::metrics;
use crate::storage::ListStore;

/// Add-item and view-cart over a shared store handle.
///
/// Writes are optimistic: read the list, build the new snapshot, then swap it
/// in only if the list is unchanged. A lost race re-reads and tries again.
pub struct CartService {
    store: Arc<dyn ListStore>,
    max_write_attempts: u32,
}

impl CartService {
    pub fn new(store: Arc<dyn ListStore>, cfg: &CartConfig) -> Self {
        Self { store, max_write_attempts: cfg.max_write_attempts.max(1) }
    }

    /// Append `item` to the owner's cart and return the cart as written.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_item(&self, owner: &str, item: Item) -> Result<Cart, ServiceError> {
        let result = self.try_add_item(owner, item).await;
        match &result {
            Ok(cart) => {
                metrics::ITEMS_ADDED_TOTAL.inc();
                info!(owner, items = cart.len(), "item_added");
            }
            Err(e) => record_failure("add_item", e),
        }
        result
    }

    async fn try_add_item(&self, owner: &str, item: Item) -> Result<Cart, ServiceError> {
        cart::validate_owner(owner).map_err(|e| ServiceError::InvalidOwner(e.to_string()))?;
        item.validate().map_err(|e| ServiceError::InvalidItem(e.to_string()))?;
        let key = cart::cart_key(owner);

        for attempt in 1..=self.max_write_attempts {
            let current = self.store.read_all(&key).await?;
            let mut next = Cart::from_snapshots(owner, &current).map_err(record_decode)?;
            next.push(item.clone());
            let blob = next.to_snapshot().map_err(record_decode)?;

            if self.store.compare_and_replace(&key, &current, blob).await? {
                return Ok(next);
            }
            metrics::WRITE_CONFLICTS_TOTAL.inc();
            debug!(owner, attempt, "cart changed during write, retrying");
        }

        Err(ServiceError::WriteConflict { owner: owner.to_string(), attempts: self.max_write_attempts })
    }

    /// Current contents of the owner's cart. Unknown owners get an empty cart.
    /// The id is used as given; only writes validate it.
    #[instrument(skip(self))]
    pub async fn view_cart(&self, owner: &str) -> Result<Cart, ServiceError> {
        let result = self.try_view_cart(owner).await;
        match &result {
            Ok(_) => metrics::CARTS_VIEWED_TOTAL.inc(),
            Err(e) => record_failure("view_cart", e),
        }
        result
    }

    async fn try_view_cart(&self, owner: &str) -> Result<Cart, ServiceError> {
        let blobs = self.store.read_all(&cart::cart_key(owner)).await?;
        Cart::from_snapshots(owner, &blobs).map_err(record_decode)
    }

    /// Whether the backing store answers.
    pub async fn ready(&self) -> Result<(), ServiceError> {
        self.store.ping().await.map_err(ServiceError::from)
    }
}

fn record_decode(e: ModelError) -> ServiceError {
    ServiceError::RecordDecode(e.to_string())
}

fn record_failure(op: &'static str, e: &ServiceError) {
    metrics::ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
    warn!(op, kind = e.kind(), error = %e, "cart operation failed");
}
