use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Wire shape of a cart item.
#[derive(ToSchema)]
pub struct ItemDoc {
    pub id: String,
    pub name: String,
    /// Non-negative decimal amount.
    #[schema(example = 12.5)]
    pub price: f64,
}

#[derive(ToSchema)]
pub struct ErrorDoc {
    /// One of `request_decode`, `invalid_owner`, `store_unavailable`, `record_decode`, `write_conflict`.
    pub error: String,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::ready,
        crate::routes::cart::add_to_cart,
        crate::routes::cart::add_to_owner_cart,
        crate::routes::cart::view_cart,
    ),
    components(
        schemas(
            HealthResponse,
            ItemDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "cart")
    )
)]
pub struct ApiDoc;
