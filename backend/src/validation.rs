//! Request gates run before any store access.

use thiserror::Error;

use crate::models::{NewProperty, PropertyPayload, PropertyStatus, StatusPayload};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Status is required")]
    MissingStatus,

    #[error("Invalid status. Must be one of: available, under_construction, occupied")]
    InvalidStatus,

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("{field} must be a number")]
    NotNumeric { field: &'static str },

    #[error("Invalid property id")]
    InvalidId,

    #[error("{0}")]
    MalformedBody(String),

    #[error("{0}")]
    MalformedQuery(String),
}

/// Treats empty and whitespace-only strings the same as an absent field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn positive<T>(field: &'static str, value: T) -> Result<T, ValidationError>
where
    T: PartialOrd + Default,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field })
    }
}

pub fn parse_status(raw: &str) -> Result<PropertyStatus, ValidationError> {
    raw.parse()
}

/// Full-record check for create and replace.
///
/// A numeric `0` counts as present; it is rejected by the positivity rule with
/// a message naming the field rather than as a missing field.
pub fn validate_property(payload: PropertyPayload) -> Result<NewProperty, ValidationError> {
    let (
        Some(property_type),
        Some(bedrooms),
        Some(kitchens),
        Some(living_rooms),
        Some(toilets),
        Some(price),
        Some(address),
        Some(status),
    ) = (
        non_empty(payload.property_type),
        payload.bedrooms,
        payload.kitchens,
        payload.living_rooms,
        payload.toilets,
        payload.price,
        non_empty(payload.address),
        non_empty(payload.status),
    )
    else {
        return Err(ValidationError::MissingFields);
    };

    let status = parse_status(&status)?;

    if !price.is_finite() {
        return Err(ValidationError::NotPositive { field: "price" });
    }

    Ok(NewProperty {
        property_type,
        bedrooms: positive("bedrooms", bedrooms)?,
        kitchens: positive("kitchens", kitchens)?,
        living_rooms: positive("living_rooms", living_rooms)?,
        toilets: positive("toilets", toilets)?,
        price: positive("price", price)?,
        address,
        status,
    })
}

pub fn validate_status(payload: StatusPayload) -> Result<PropertyStatus, ValidationError> {
    let status = non_empty(payload.status).ok_or(ValidationError::MissingStatus)?;
    parse_status(&status)
}
