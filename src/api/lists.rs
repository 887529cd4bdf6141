//! List endpoints (owner or admin)

use crate::api::{ApiError, AppState};
use crate::auth::guard::{self, ListScope, Missing};
use crate::auth::Identity;
use crate::models::{validate_text, CreateListRequest, NameRequest, TodoList, MAX_LIST_NAME_LEN};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};

/// GET /lists - own lists, or every list for admins
pub async fn get_lists(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<TodoList>>, ApiError> {
    let lists = match guard::list_scope(&identity) {
        ListScope::OwnedBy(owner_id) => state.store.lists_for_owner(owner_id)?,
        ListScope::All => state.store.all_lists()?,
    };

    debug!(user_id = identity.user_id, count = lists.len(), "Listed lists");

    Ok(Json(lists))
}

/// POST /lists
pub async fn create_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateListRequest>, JsonRejection>,
) -> Result<Json<TodoList>, ApiError> {
    // The owner named in the body is the guard's input.
    let Json(payload) = payload?;
    guard::authorize_list_create(&identity, payload.owner_id)?;
    validate_text("name", &payload.name, MAX_LIST_NAME_LEN).map_err(ApiError::BadRequest)?;

    if state.store.get_user(payload.owner_id)?.is_none() {
        return Err(ApiError::BadRequest("Owner not found".to_string()));
    }

    let list = state.store.create_list(&payload.name, payload.owner_id)?;

    info!(by = identity.user_id, owner_id = list.owner_id, "List created: {}", list.id);

    Ok(Json(list))
}

/// PUT /lists/:id
pub async fn edit_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<TodoList>, ApiError> {
    let owner = state.store.list_owner(id)?;
    guard::authorize_owned(&identity, owner, Missing::Target)?;
    let Json(payload) = payload?;
    validate_text("name", &payload.name, MAX_LIST_NAME_LEN).map_err(ApiError::BadRequest)?;

    let list = state
        .store
        .rename_list(id, &payload.name)?
        .ok_or(ApiError::NotFound("List not found"))?;

    Ok(Json(list))
}

/// DELETE /lists/:id - removes the list's items as well
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let owner = state.store.list_owner(id)?;
    guard::authorize_owned(&identity, owner, Missing::Target)?;

    if !state.store.delete_list(id)? {
        return Err(ApiError::NotFound("List not found"));
    }

    info!(by = identity.user_id, "List deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}
