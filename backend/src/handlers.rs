use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{found, AppError};
use crate::filters::SearchFilters;
use crate::models::{
    CreatedResponse, MessageResponse, Property, PropertyPayload, StatusPayload,
};
use crate::validation::{self, ValidationError};
use crate::AppState;

/// `:id` path segment parsed as a property id.
pub struct PropertyId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for PropertyId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ValidationError::InvalidId)?;
        let id = raw.parse().map_err(|_| ValidationError::InvalidId)?;
        Ok(Self(id))
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()).into())
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.repo.gateway().ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn list_properties(
    State(state): State<AppState>,
) -> Result<Json<Vec<Property>>, AppError> {
    Ok(Json(state.repo.list_all().await?))
}

pub async fn get_property(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
) -> Result<Json<Property>, AppError> {
    state
        .repo
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn search_properties(
    State(state): State<AppState>,
    search: Result<Query<SearchFilters>, QueryRejection>,
) -> Result<Json<Vec<Property>>, AppError> {
    let Query(search) =
        search.map_err(|rejection| ValidationError::MalformedQuery(rejection.body_text()))?;
    Ok(Json(state.repo.search(&search).await?))
}

pub async fn list_by_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<Property>>, AppError> {
    let status = validation::parse_status(&raw)?;
    Ok(Json(state.repo.list_by_status(status).await?))
}

pub async fn create_property(
    State(state): State<AppState>,
    payload: Result<Json<PropertyPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let record = validation::validate_property(json_body(payload)?)?;
    let id = state.repo.create(record).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: "Property created successfully",
        }),
    ))
}

pub async fn update_property(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
    payload: Result<Json<PropertyPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = validation::validate_property(json_body(payload)?)?;
    found(state.repo.replace(id, record).await?)?;
    Ok(Json(MessageResponse {
        message: "Property updated successfully",
    }))
}

pub async fn update_property_status(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let status = validation::validate_status(json_body(payload)?)?;
    found(state.repo.patch_status(id, status).await?)?;
    Ok(Json(MessageResponse {
        message: "Property status updated successfully",
    }))
}

pub async fn delete_property(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
) -> Result<Json<MessageResponse>, AppError> {
    found(state.repo.delete(id).await?)?;
    Ok(Json(MessageResponse {
        message: "Property deleted successfully",
    }))
}
