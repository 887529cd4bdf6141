//! Item endpoints (owner of the containing list, or admin)

use crate::api::{ApiError, AppState};
use crate::auth::guard::{self, Missing};
use crate::auth::Identity;
use crate::models::{validate_text, Item, NameRequest, MAX_ITEM_NAME_LEN};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::debug;

/// GET /lists/:id/items
pub async fn get_items(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(list_id): Path<i64>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let owner = state.store.list_owner(list_id)?;
    guard::authorize_owned(&identity, owner, Missing::Reference)?;

    Ok(Json(state.store.items_for_list(list_id)?))
}

/// POST /lists/:id/items
pub async fn add_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(list_id): Path<i64>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let owner = state.store.list_owner(list_id)?;
    guard::authorize_owned(&identity, owner, Missing::Reference)?;
    let Json(payload) = payload?;
    validate_text("name", &payload.name, MAX_ITEM_NAME_LEN).map_err(ApiError::BadRequest)?;

    let item = state.store.create_item(&payload.name, list_id)?;

    debug!(by = identity.user_id, list_id, "Item added: {}", item.id);

    Ok(Json(item))
}

/// PUT /items/:id
pub async fn edit_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let owner = state.store.item_owner(id)?;
    guard::authorize_owned(&identity, owner, Missing::Target)?;
    let Json(payload) = payload?;
    validate_text("name", &payload.name, MAX_ITEM_NAME_LEN).map_err(ApiError::BadRequest)?;

    let item = state
        .store
        .rename_item(id, &payload.name)?
        .ok_or(ApiError::NotFound("Item not found"))?;

    Ok(Json(item))
}

/// DELETE /items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let owner = state.store.item_owner(id)?;
    guard::authorize_owned(&identity, owner, Missing::Target)?;

    if !state.store.delete_item(id)? {
        return Err(ApiError::NotFound("Item not found"));
    }

    debug!(by = identity.user_id, "Item deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}
