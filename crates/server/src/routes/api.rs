//! JSON endpoints over the caller's request-scoped data layer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use datalayer::{Entries, PushOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;
use crate::routes::AppState;
use crate::session::{request_store, resolve_session};

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub data: Value,
    #[serde(flatten)]
    pub options: PushOptions,
}

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub value: Value,
    #[serde(flatten)]
    pub options: PushOptions,
}

#[derive(Debug, Serialize)]
pub struct DataLayerOutput {
    /// Entries buffered at the end of the request
    pub data: Entries,
    /// Markup produced by echo pushes, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

pub async fn show(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Json<Entries>), ApiError> {
    let (jar, id) = resolve_session(jar, &state.datalayer.session_cookie);
    let store = request_store(&state, &id)?;
    Ok((jar, Json(store.data())))
}

pub async fn merge(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<MergeRequest>,
) -> Result<(CookieJar, Json<DataLayerOutput>), ApiError> {
    let (jar, id) = resolve_session(jar, &state.datalayer.session_cookie);
    let mut store = request_store(&state, &id)?;
    store.merge_value(input.data, input.options)?;
    Ok((jar, Json(output(store.data(), store.into_output()))))
}

pub async fn set(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(key): Path<String>,
    Json(input): Json<SetRequest>,
) -> Result<(CookieJar, Json<DataLayerOutput>), ApiError> {
    let (jar, id) = resolve_session(jar, &state.datalayer.session_cookie);
    let mut store = request_store(&state, &id)?;
    store.set(key, input.value, input.options)?;
    Ok((jar, Json(output(store.data(), store.into_output()))))
}

pub async fn clear(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, StatusCode), ApiError> {
    let (jar, id) = resolve_session(jar, &state.datalayer.session_cookie);
    let mut store = request_store(&state, &id)?;
    store.clear()?;
    Ok((jar, StatusCode::NO_CONTENT))
}

fn output(data: Entries, markup: String) -> DataLayerOutput {
    DataLayerOutput { data, markup: (!markup.is_empty()).then_some(markup) }
}
