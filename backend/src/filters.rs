//! Builds the search statement from optional query-string filters.
//!
//! Values are never written into the statement text. Each predicate refers to
//! a numbered placeholder (`?1`, `?2`, ...) and the matching value is pushed
//! onto the parameter list in the same order.

use serde::Deserialize;

use crate::models::PropertyStatus;
use crate::validation::{parse_status, ValidationError};

const SELECT_PROPERTIES: &str = "SELECT id, type AS property_type, bedrooms, kitchens, \
     living_rooms, toilets, price, address, status, created_at FROM properties";

const NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

/// Raw `?type=&min_bedrooms=&max_price=&status=` values. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub min_bedrooms: Option<String>,
    pub max_price: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i32),
    Real(f64),
    Status(PropertyStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<FilterValue>,
}

#[derive(Default)]
struct Predicates {
    conditions: Vec<String>,
    params: Vec<FilterValue>,
}

impl Predicates {
    fn push(&mut self, column_op: &str, value: FilterValue) {
        self.params.push(value);
        self.conditions
            .push(format!("{} ?{}", column_op, self.params.len()));
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Compiles `filters` in the fixed order type, min_bedrooms, max_price, status.
pub fn compile(filters: &SearchFilters) -> Result<CompiledQuery, ValidationError> {
    let mut predicates = Predicates::default();

    if let Some(property_type) = present(&filters.property_type) {
        predicates.push("type =", FilterValue::Text(property_type.to_string()));
    }
    if let Some(min_bedrooms) = present(&filters.min_bedrooms) {
        let min_bedrooms = min_bedrooms
            .parse::<i32>()
            .map_err(|_| ValidationError::NotNumeric { field: "min_bedrooms" })?;
        predicates.push("bedrooms >=", FilterValue::Integer(min_bedrooms));
    }
    if let Some(max_price) = present(&filters.max_price) {
        let max_price = max_price
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite())
            .ok_or(ValidationError::NotNumeric { field: "max_price" })?;
        predicates.push("price <=", FilterValue::Real(max_price));
    }
    if let Some(status) = present(&filters.status) {
        predicates.push("status =", FilterValue::Status(parse_status(status)?));
    }

    let mut sql = String::from(SELECT_PROPERTIES);
    if !predicates.conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.conditions.join(" AND "));
    }
    sql.push_str(NEWEST_FIRST);

    Ok(CompiledQuery {
        sql,
        params: predicates.params,
    })
}
