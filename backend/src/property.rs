use diesel::prelude::*;
use diesel::sql_types::{Double, Integer, Text};
use diesel::sqlite::Sqlite;
use log::{debug, info};
use thiserror::Error;

use crate::db::{StoreError, StoreGateway};
use crate::filters::{self, FilterValue, SearchFilters};
use crate::models::{NewProperty, Property, PropertyStatus};
use crate::schema::properties::dsl::*;
use crate::validation::ValidationError;

/// Search fails either before reaching the store or inside it.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Property persistence. Holds nothing but the gateway; every method is a
/// single statement.
#[derive(Clone)]
pub struct PropertyRepository {
    gateway: StoreGateway,
}

impl PropertyRepository {
    pub fn new(gateway: StoreGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &StoreGateway {
        &self.gateway
    }

    /// Fetches every property, newest first
    pub async fn list_all(&self) -> Result<Vec<Property>, StoreError> {
        let props = self
            .gateway
            .run(|conn| {
                properties
                    .select(Property::as_select())
                    .order_by((created_at.desc(), id.desc()))
                    .load(conn)
            })
            .await?;
        info!("Fetched {} properties", props.len());
        Ok(props)
    }

    pub async fn get_by_id(&self, property_id: i32) -> Result<Option<Property>, StoreError> {
        debug!("Fetching property with ID: {}", property_id);
        self.gateway
            .run(move |conn| {
                properties
                    .find(property_id)
                    .select(Property::as_select())
                    .first(conn)
                    .optional()
            })
            .await
    }

    /// Inserts a property and returns the id the store assigned to it
    pub async fn create(&self, new_property: NewProperty) -> Result<i32, StoreError> {
        let new_id = self
            .gateway
            .run(move |conn| {
                diesel::insert_into(properties)
                    .values(&new_property)
                    .returning(id)
                    .get_result(conn)
            })
            .await?;
        info!("Created property {}", new_id);
        Ok(new_id)
    }

    /// Overwrites every mutable column. Returns the number of rows touched.
    pub async fn replace(
        &self,
        property_id: i32,
        record: NewProperty,
    ) -> Result<usize, StoreError> {
        let affected = self
            .gateway
            .run(move |conn| {
                diesel::update(properties.find(property_id))
                    .set(&record)
                    .execute(conn)
            })
            .await?;
        debug!("Replace of property {} touched {} rows", property_id, affected);
        Ok(affected)
    }

    pub async fn patch_status(
        &self,
        property_id: i32,
        new_status: PropertyStatus,
    ) -> Result<usize, StoreError> {
        let affected = self
            .gateway
            .run(move |conn| {
                diesel::update(properties.find(property_id))
                    .set(status.eq(new_status))
                    .execute(conn)
            })
            .await?;
        debug!(
            "Status of property {} set to {} ({} rows)",
            property_id, new_status, affected
        );
        Ok(affected)
    }

    pub async fn delete(&self, property_id: i32) -> Result<usize, StoreError> {
        let affected = self
            .gateway
            .run(move |conn| diesel::delete(properties.find(property_id)).execute(conn))
            .await?;
        debug!("Delete of property {} touched {} rows", property_id, affected);
        Ok(affected)
    }

    /// Compiles `search` with [`filters::compile`] and runs the statement,
    /// binding its parameters in placeholder order.
    pub async fn search(&self, search: &SearchFilters) -> Result<Vec<Property>, SearchError> {
        let query = filters::compile(search)?;
        debug!("Search: {} ({} params)", query.sql, query.params.len());
        let props = self
            .gateway
            .run(move |conn| {
                let mut statement = diesel::sql_query(query.sql).into_boxed::<Sqlite>();
                for param in query.params {
                    statement = match param {
                        FilterValue::Text(value) => statement.bind::<Text, _>(value),
                        FilterValue::Integer(value) => statement.bind::<Integer, _>(value),
                        FilterValue::Real(value) => statement.bind::<Double, _>(value),
                        FilterValue::Status(value) => statement.bind::<Text, _>(value),
                    };
                }
                statement.load::<Property>(conn)
            })
            .await?;
        info!("Search matched {} properties", props.len());
        Ok(props)
    }

    pub async fn list_by_status(
        &self,
        wanted: PropertyStatus,
    ) -> Result<Vec<Property>, StoreError> {
        self.gateway
            .run(move |conn| {
                properties
                    .filter(status.eq(wanted))
                    .select(Property::as_select())
                    .order_by((created_at.desc(), id.desc()))
                    .load(conn)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backdate(repo: &PropertyRepository, property_id: i32, timestamp: &'static str) {
        repo.gateway()
            .run(move |conn| {
                diesel::sql_query("UPDATE properties SET created_at = ?1 WHERE id = ?2")
                    .bind::<Text, _>(timestamp)
                    .bind::<Integer, _>(property_id)
                    .execute(conn)
            })
            .await
            .unwrap();
    }

    fn listing(kind: &str, beds: i32, cost: f64, state: PropertyStatus) -> NewProperty {
        NewProperty {
            property_type: kind.into(),
            bedrooms: beds,
            kitchens: 1,
            living_rooms: 1,
            toilets: 1,
            price: cost,
            address: format!("{} {} St", beds, kind),
            status: state,
        }
    }

    async fn seeded() -> PropertyRepository {
        let repo = PropertyRepository::new(StoreGateway::in_memory().unwrap());
        repo.create(listing("flat", 1, 90000.0, PropertyStatus::Available))
            .await
            .unwrap();
        repo.create(listing("house", 3, 250000.0, PropertyStatus::Occupied))
            .await
            .unwrap();
        repo.create(listing("flat", 2, 120000.0, PropertyStatus::UnderConstruction))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let repo = PropertyRepository::new(StoreGateway::in_memory().unwrap());
        let record = listing("flat", 2, 100000.0, PropertyStatus::Available);
        let new_id = repo.create(record.clone()).await.unwrap();

        let stored = repo.get_by_id(new_id).await.unwrap().unwrap();
        assert_eq!(stored.id, new_id);
        assert_eq!(stored.property_type, record.property_type);
        assert_eq!(stored.bedrooms, record.bedrooms);
        assert_eq!(stored.price, record.price);
        assert_eq!(stored.address, record.address);
        assert_eq!(stored.status, record.status);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let repo = PropertyRepository::new(StoreGateway::in_memory().unwrap());
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_is_newest_first() {
        let repo = seeded().await;
        let ids: Vec<i32> = repo.list_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn older_rows_sort_last_regardless_of_id() {
        let repo = seeded().await;
        backdate(&repo, 3, "2000-01-01 00:00:00").await;
        backdate(&repo, 1, "2010-06-15 12:00:00").await;

        let ids: Vec<i32> = repo.list_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let searched: Vec<i32> = repo
            .search(&SearchFilters::default())
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(searched, vec![2, 1, 3]);

        let flats: Vec<i32> = repo
            .search(&SearchFilters {
                property_type: Some("flat".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(flats, vec![1, 3]);
    }

    #[tokio::test]
    async fn search_rejects_bad_filters_before_the_store() {
        let repo = seeded().await;
        let err = repo
            .search(&SearchFilters {
                status: Some("sold".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Invalid(ValidationError::InvalidStatus)));
    }

    #[tokio::test]
    async fn mutations_report_affected_rows() {
        let repo = seeded().await;
        let replacement = listing("villa", 5, 900000.0, PropertyStatus::Occupied);

        assert_eq!(repo.replace(1, replacement.clone()).await.unwrap(), 1);
        assert_eq!(repo.replace(42, replacement).await.unwrap(), 0);

        let updated = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(updated.property_type, "villa");
        assert_eq!(updated.bedrooms, 5);

        assert_eq!(repo.patch_status(2, PropertyStatus::Available).await.unwrap(), 1);
        assert_eq!(repo.patch_status(42, PropertyStatus::Available).await.unwrap(), 0);
        let patched = repo.get_by_id(2).await.unwrap().unwrap();
        assert_eq!(patched.status, PropertyStatus::Available);
        assert_eq!(patched.property_type, "house");

        assert_eq!(repo.delete(3).await.unwrap(), 1);
        assert_eq!(repo.delete(3).await.unwrap(), 0);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_applies_every_filter() {
        let repo = seeded().await;

        let all = repo.search(&SearchFilters::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let cheap = repo
            .search(&SearchFilters {
                max_price: Some("120000".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 2);
        assert!(cheap.iter().all(|p| p.price <= 120000.0));

        let flats = repo
            .search(&SearchFilters {
                property_type: Some("flat".into()),
                min_bedrooms: Some("2".into()),
                status: Some("under_construction".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(flats.len(), 1);
        assert_eq!(flats[0].id, 3);
    }

    #[tokio::test]
    async fn search_binds_quotes_as_data() {
        let repo = seeded().await;
        let found = repo
            .search(&SearchFilters {
                property_type: Some("flat' OR '1'='1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn list_by_status_filters_rows() {
        let repo = seeded().await;
        let occupied = repo.list_by_status(PropertyStatus::Occupied).await.unwrap();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].property_type, "house");
    }
}
