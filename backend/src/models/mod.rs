use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

use crate::schema::properties;
use crate::validation::ValidationError;

/// Lifecycle state of a listing. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    UnderConstruction,
    Occupied,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 3] = [
        PropertyStatus::Available,
        PropertyStatus::UnderConstruction,
        PropertyStatus::Occupied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::UnderConstruction => "under_construction",
            PropertyStatus::Occupied => "occupied",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(ValidationError::InvalidStatus)
    }
}

impl ToSql<Text, Sqlite> for PropertyStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for PropertyStatus {
    fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = properties)]
pub struct Property {
    pub id: i32,
    #[serde(rename = "type")]
    pub property_type: String,
    pub bedrooms: i32,
    pub kitchens: i32,
    pub living_rooms: i32,
    pub toilets: i32,
    pub price: f64,
    pub address: String,
    pub status: PropertyStatus,
    pub created_at: NaiveDateTime,
}

/// Every mutable column of a listing, already validated.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub property_type: String,
    pub bedrooms: i32,
    pub kitchens: i32,
    pub living_rooms: i32,
    pub toilets: i32,
    pub price: f64,
    pub address: String,
    pub status: PropertyStatus,
}

/// Body of POST and PUT requests. Fields stay optional so that absence can be
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct PropertyPayload {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub bedrooms: Option<i32>,
    pub kitchens: Option<i32>,
    pub living_rooms: Option<i32>,
    pub toilets: Option<i32>,
    pub price: Option<f64>,
    pub address: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusPayload {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i32,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_canonical_names() {
        assert_eq!("available".parse::<PropertyStatus>().unwrap(), PropertyStatus::Available);
        assert_eq!(
            "under_construction".parse::<PropertyStatus>().unwrap(),
            PropertyStatus::UnderConstruction
        );
        assert!("under construction".parse::<PropertyStatus>().is_err());
        assert!("en travaux".parse::<PropertyStatus>().is_err());
        assert!("Available".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn property_serializes_type_field_name() {
        let property = Property {
            id: 7,
            property_type: "flat".into(),
            bedrooms: 2,
            kitchens: 1,
            living_rooms: 1,
            toilets: 1,
            price: 100000.0,
            address: "1 Main St".into(),
            status: PropertyStatus::UnderConstruction,
            created_at: NaiveDateTime::default(),
        };
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["type"], "flat");
        assert_eq!(json["status"], "under_construction");
        assert!(json.get("property_type").is_none());
    }
}
