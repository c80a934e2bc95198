//! Route handlers.
//!
//! Handlers only translate HTTP to core calls; every rule about ranking,
//! filtering and persistence lives in `distrimap_core`.

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::params::{ListingParams, NearestParams};
use crate::payload::DistributeurInput;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use distrimap_core::{
    DirectoryStats, Distributeur, DistributeurId, DistributeurListQuery, ListedDistributeur,
};
use log::info;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = HealthReport {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime_secs(),
    };
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        Envelope::ok(report),
    )
}

pub async fn list_distributeurs(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<ListedDistributeur>>> {
    let Query(params) = params.map_err(query_rejection)?;
    let request = params.into_request(state.config())?;
    let items = state
        .with_directory(move |directory| directory.list(&request))
        .await?;
    Ok(Envelope::list(items))
}

pub async fn nearest_distributeurs(
    State(state): State<AppState>,
    params: Result<Query<NearestParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<ListedDistributeur>>> {
    let Query(params) = params.map_err(query_rejection)?;
    let request = params.into_request(state.config())?;
    let items = state
        .with_directory(move |directory| {
            directory.find_nearest(
                request.reference,
                &DistributeurListQuery::default(),
                request.limit,
            )
        })
        .await?;
    Ok(Envelope::list(items))
}

pub async fn get_distributeur(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Envelope<Distributeur>> {
    let id = parse_id(&raw_id)?;
    state
        .with_directory(move |directory| directory.get(id))
        .await?
        .map(Envelope::ok)
        .ok_or(ApiError::NotFound(id))
}

pub async fn list_villes(State(state): State<AppState>) -> ApiResult<Envelope<Vec<String>>> {
    let villes = state.with_directory(|directory| directory.villes()).await?;
    Ok(Envelope::list(villes))
}

pub async fn list_types(State(state): State<AppState>) -> ApiResult<Envelope<Vec<String>>> {
    let types = state.with_directory(|directory| directory.types()).await?;
    Ok(Envelope::list(types))
}

pub async fn admin_stats(State(state): State<AppState>) -> ApiResult<Envelope<DirectoryStats>> {
    let stats = state.with_directory(|directory| directory.stats()).await?;
    Ok(Envelope::ok(stats))
}

pub async fn create_distributeur(
    State(state): State<AppState>,
    payload: Result<Json<DistributeurInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Envelope<Distributeur>)> {
    let Json(input) = payload.map_err(json_rejection)?;
    let distributeur = input.into_distributeur(Uuid::new_v4());
    distributeur.validate()?;

    let created = state
        .with_directory(move |directory| directory.create(&distributeur))
        .await?;
    info!(
        "event=admin_create module=api status=ok distributeur_id={}",
        created.id
    );
    Ok((
        StatusCode::CREATED,
        Envelope::ok(created).with_message("distributeur created"),
    ))
}

pub async fn update_distributeur(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<DistributeurInput>, JsonRejection>,
) -> ApiResult<Envelope<Distributeur>> {
    let id = parse_id(&raw_id)?;
    let Json(input) = payload.map_err(json_rejection)?;
    let distributeur = input.into_distributeur(id);
    distributeur.validate()?;

    let updated = state
        .with_directory(move |directory| directory.update(&distributeur))
        .await?;
    info!(
        "event=admin_update module=api status=ok distributeur_id={}",
        updated.id
    );
    Ok(Envelope::ok(updated).with_message("distributeur updated"))
}

pub async fn delete_distributeur(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Envelope<()>> {
    let id = parse_id(&raw_id)?;
    state
        .with_directory(move |directory| directory.delete(id))
        .await?;
    info!("event=admin_delete module=api status=ok distributeur_id={id}");
    Ok(Envelope::done("distributeur deleted"))
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

fn parse_id(raw: &str) -> ApiResult<DistributeurId> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::bad_request(format!("`{raw}` is not a valid distributeur id")))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(format!("invalid body: {}", rejection.body_text()))
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request(format!("invalid query: {}", rejection.body_text()))
}
