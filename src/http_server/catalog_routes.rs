//! Catalog HTTP Routes
//!
//! Attributes, channel types, bindings and resolved schemas.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::CatalogError;
use crate::records::plain_attributes;
use crate::registry::{AttributePatch, ChannelTypePatch, NewAttribute, NewChannelType};
use crate::schema::{check, ValidationMode};

use super::errors::ApiResult;
use super::server::ApiState;
use super::views::{AttributeView, BindingView, ChannelTypeView, SchemaView, ValidationView};

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub attribute_id: i64,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub display_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRequiredRequest {
    pub is_required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub attribute_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Validate as an edit of an existing record
    #[serde(default)]
    pub update: bool,
}

// ==================
// Catalog Routes
// ==================

pub fn catalog_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/attributes", get(list_attributes).post(create_attribute))
        .route(
            "/attributes/:id",
            get(get_attribute).patch(update_attribute).delete(delete_attribute),
        )
        .route("/channel-types", get(list_types).post(create_type))
        .route(
            "/channel-types/:id",
            get(get_type).patch(update_type).delete(delete_type),
        )
        .route("/channel-types/:id/schema", get(get_schema))
        .route("/channel-types/:id/bindings", get(list_bindings).post(attach))
        .route(
            "/channel-types/:id/bindings/:attribute_id",
            patch(set_required).delete(detach),
        )
        .route("/channel-types/:id/binding-order", put(reorder))
        .route("/channel-types/:id/validate", post(validate_record))
        .with_state(state)
}

// ==================
// Attribute Handlers
// ==================

async fn list_attributes(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<AttributeView>>> {
    let attributes = state.catalog.attributes.list()?;
    Ok(Json(attributes.iter().map(AttributeView::from).collect()))
}

async fn create_attribute(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<NewAttribute>,
) -> ApiResult<(StatusCode, Json<AttributeView>)> {
    let attribute = state.catalog.attributes.create(request)?;
    Ok((StatusCode::CREATED, Json(AttributeView::from(&attribute))))
}

async fn get_attribute(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AttributeView>> {
    let attribute = state.catalog.attributes.get(id)?;
    Ok(Json(AttributeView::from(&attribute)))
}

async fn update_attribute(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<AttributePatch>,
) -> ApiResult<Json<AttributeView>> {
    let attribute = state.catalog.attributes.update(id, request)?;
    Ok(Json(AttributeView::from(&attribute)))
}

async fn delete_attribute(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.attributes.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================
// Channel Type Handlers
// ==================

async fn list_types(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<ChannelTypeView>>> {
    let types = state.catalog.types.list()?;
    Ok(Json(types.iter().map(ChannelTypeView::from).collect()))
}

async fn create_type(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<NewChannelType>,
) -> ApiResult<(StatusCode, Json<ChannelTypeView>)> {
    let channel_type = state.catalog.types.create(request)?;
    Ok((StatusCode::CREATED, Json(ChannelTypeView::from(&channel_type))))
}

async fn get_type(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ChannelTypeView>> {
    let channel_type = state.catalog.types.get(id)?;
    Ok(Json(ChannelTypeView::from(&channel_type)))
}

async fn update_type(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<ChannelTypePatch>,
) -> ApiResult<Json<ChannelTypeView>> {
    let channel_type = state.catalog.types.update(id, request)?;
    Ok(Json(ChannelTypeView::from(&channel_type)))
}

async fn delete_type(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.types.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================
// Schema Handlers
// ==================

async fn get_schema(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SchemaView>> {
    let schema = state.catalog.resolver.resolve(id)?;
    Ok(Json(SchemaView::from(&schema)))
}

async fn list_bindings(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<BindingView>>> {
    state.catalog.types.get(id)?;
    let bindings = state.catalog.binder.bindings_for_type(id)?;
    Ok(Json(bindings.iter().map(BindingView::from).collect()))
}

async fn attach(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<AttachRequest>,
) -> ApiResult<(StatusCode, Json<BindingView>)> {
    let binding = state.catalog.binder.attach(
        id,
        request.attribute_id,
        request.is_required,
        request.display_order,
    )?;
    Ok((StatusCode::CREATED, Json(BindingView::from(&binding))))
}

async fn set_required(
    State(state): State<Arc<ApiState>>,
    Path((id, attribute_id)): Path<(i64, i64)>,
    Json(request): Json<SetRequiredRequest>,
) -> ApiResult<Json<BindingView>> {
    let binding = state
        .catalog
        .binder
        .set_required(id, attribute_id, request.is_required)?;
    Ok(Json(BindingView::from(&binding)))
}

async fn detach(
    State(state): State<Arc<ApiState>>,
    Path((id, attribute_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state.catalog.binder.detach(id, attribute_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<BindingView>>> {
    let bindings = state.catalog.binder.reorder(id, &request.attribute_ids)?;
    Ok(Json(bindings.iter().map(BindingView::from).collect()))
}

/// Dry run: validation issues come back as data with 200, not as an error
async fn validate_record(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<Json<ValidationView>> {
    let schema = state.catalog.resolver.resolve(id)?;
    let mode = if request.update {
        ValidationMode::Update
    } else {
        ValidationMode::Create
    };

    let view = match check(&schema, &request.name, &request.attributes, mode) {
        Ok(record) => ValidationView {
            valid: true,
            issues: Vec::new(),
            attributes: plain_attributes(&record.attributes),
        },
        Err(CatalogError::Validation(issues)) => ValidationView {
            valid: false,
            issues,
            attributes: Map::new(),
        },
        Err(err) => return Err(err.into()),
    };
    Ok(Json(view))
}
