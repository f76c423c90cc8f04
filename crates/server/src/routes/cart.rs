use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{errors::ModelError, Item};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::ServerState;

fn decode_item(body: &[u8]) -> Result<Item, ApiError> {
    Item::from_json(body).map_err(|e| match e {
        ModelError::Decode(msg) | ModelError::Validation(msg) => ApiError::RequestDecode(msg),
    })
}

async fn add(state: &ServerState, owner: &str, item: Item) -> Result<(StatusCode, String), ApiError> {
    state.cart.add_item(owner, item).await?;
    Ok((StatusCode::CREATED, format!("Product added to cart: {owner}")))
}

/// Add an item to a fresh cart whose owner id is generated here and echoed back.
#[utoipa::path(
    post,
    path = "/add-to-cart",
    tag = "cart",
    request_body = crate::openapi::ItemDoc,
    responses(
        (status = 201, description = "Added; body carries the generated owner id"),
        (status = 400, description = "Body is not a valid item", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Store failure", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn add_to_cart(State(state): State<ServerState>, body: Bytes) -> Result<(StatusCode, String), ApiError> {
    // decode before generating an id so malformed bodies never touch the store
    let item = decode_item(&body)?;
    let owner = Uuid::new_v4().to_string();
    debug!(%owner, "generated owner id");
    add(&state, &owner, item).await
}

/// Add an item to the named owner's cart.
#[utoipa::path(
    post,
    path = "/add-to-cart/{user_id}",
    tag = "cart",
    params(("user_id" = String, Path, description = "Cart owner")),
    request_body = crate::openapi::ItemDoc,
    responses(
        (status = 201, description = "Added"),
        (status = 400, description = "Bad body or owner id", body = crate::openapi::ErrorDoc),
        (status = 409, description = "Too many concurrent writers", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Store failure", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn add_to_owner_cart(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, String), ApiError> {
    let item = decode_item(&body)?;
    add(&state, &user_id, item).await
}

/// Items in the owner's cart, in insertion order.
#[utoipa::path(
    get,
    path = "/view-cart/{user_id}",
    tag = "cart",
    params(("user_id" = String, Path, description = "Cart owner")),
    responses(
        (status = 200, description = "Cart contents", body = [crate::openapi::ItemDoc]),
        (status = 500, description = "Store or record failure", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn view_cart(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let cart = state.cart.view_cart(&user_id).await?;
    Ok(Json(cart.items))
}
