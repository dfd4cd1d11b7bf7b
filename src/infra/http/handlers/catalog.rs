//! Read endpoints: cached lookups, lists, menu trees and search.

use std::fmt;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::application::content::{ListParams, Reply};
use crate::application::error::ProxyError;
use crate::domain::resource::Resource;
use crate::infra::http::auth::HeaderBearer;
use crate::infra::http::state::HttpState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

pub async fn list_books(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Reply, ProxyError> {
    let Query(params) = params.map_err(invalid_request)?;
    state.content.list(Resource::Books, &params, bearer).await
}

pub async fn get_book(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    id: Result<Path<String>, PathRejection>,
) -> Result<Reply, ProxyError> {
    let Path(id) = id.map_err(invalid_request)?;
    state.content.entity(Resource::Books, &id, bearer).await
}

pub async fn list_menu_book(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Reply, ProxyError> {
    let Query(params) = params.map_err(invalid_request)?;
    state.content.menu_tree(&params, bearer).await
}

pub async fn get_menu_entry(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    id: Result<Path<String>, PathRejection>,
) -> Result<Reply, ProxyError> {
    let Path(id) = id.map_err(invalid_request)?;
    state.content.entity(Resource::MenuBook, &id, bearer).await
}

pub async fn get_exam(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    id: Result<Path<String>, PathRejection>,
) -> Result<Reply, ProxyError> {
    let Path(id) = id.map_err(invalid_request)?;
    state.content.entity(Resource::Exams, &id, bearer).await
}

pub async fn get_question(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    id: Result<Path<String>, PathRejection>,
) -> Result<Reply, ProxyError> {
    let Path(id) = id.map_err(invalid_request)?;
    state.content.entity(Resource::Questions, &id, bearer).await
}

pub async fn search(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Reply, ProxyError> {
    let Query(query) = query.map_err(invalid_request)?;
    state.content.search(query.search.as_deref(), bearer).await
}

// Malformed query strings and paths get the same JSON 400 as missing parameters.
fn invalid_request(rejection: impl fmt::Display) -> ProxyError {
    ProxyError::validation(rejection.to_string())
}
