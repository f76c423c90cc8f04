//! Prometheus counters for cart traffic (default registry).

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

pub static ITEMS_ADDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cart_items_added_total", "Items successfully added to carts")
        .expect("register cart_items_added_total")
});

pub static CARTS_VIEWED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cart_views_total", "Successful view-cart calls")
        .expect("register cart_views_total")
});

pub static WRITE_CONFLICTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "cart_write_conflicts_total",
        "Optimistic cart writes that lost a race and were retried"
    )
    .expect("register cart_write_conflicts_total")
});

pub static ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("cart_errors_total", "Cart operation failures by kind", &["kind"])
        .expect("register cart_errors_total")
});
