//! Channel HTTP Routes
//!
//! The record-level API: `{id, channelTypeId, name, attributes, isActive}`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::records::{ChannelFilter, ChannelUpdate, NewChannel};

use super::errors::ApiResult;
use super::server::ApiState;
use super::views::ChannelView;

pub fn channel_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/channels", get(list_channels).post(create_channel))
        .route(
            "/channels/:id",
            get(get_channel).patch(update_channel).delete(delete_channel),
        )
        .with_state(state)
}

async fn list_channels(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<ChannelFilter>,
) -> ApiResult<Json<Vec<ChannelView>>> {
    let records = state.catalog.channels.list(filter)?;
    Ok(Json(records.iter().map(ChannelView::from).collect()))
}

async fn create_channel(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<NewChannel>,
) -> ApiResult<(StatusCode, Json<ChannelView>)> {
    let record = state.catalog.channels.create(request)?;
    Ok((StatusCode::CREATED, Json(ChannelView::from(&record))))
}

async fn get_channel(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ChannelView>> {
    let record = state.catalog.channels.get(id)?;
    Ok(Json(ChannelView::from(&record)))
}

async fn update_channel(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(request): Json<ChannelUpdate>,
) -> ApiResult<Json<ChannelView>> {
    let record = state.catalog.channels.update(id, request)?;
    Ok(Json(ChannelView::from(&record)))
}

async fn delete_channel(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.channels.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
