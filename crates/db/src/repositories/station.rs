//! Station repository with a read-through cache.
//!
//! Station rows are effectively immutable once created, so lookups by code
//! go through a moka TTL cache. A miss only costs a query.

use std::time::Duration;

use chrono::Utc;
use fuelgate_shared::{CacheConfig, UnknownStationPolicy};
use fuelgate_shared::types::StationId;
use moka::future::Cache;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use crate::entities::stations;

/// Station repository.
#[derive(Clone)]
pub struct StationRepository {
    db: DatabaseConnection,
    cache: Cache<String, stations::Model>,
}

impl StationRepository {
    /// Creates a station repository with the configured cache bounds.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.station_capacity)
            .time_to_live(Duration::from_secs(config.station_ttl_secs))
            .build();
        Self { db, cache }
    }

    /// Finds a station by code, consulting the cache first.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<stations::Model>, DbErr> {
        if let Some(station) = self.cache.get(code).await {
            return Ok(Some(station));
        }

        let station = stations::Entity::find()
            .filter(stations::Column::Code.eq(code))
            .one(&self.db)
            .await?;

        if let Some(station) = &station {
            self.cache.insert(code.to_string(), station.clone()).await;
        }
        Ok(station)
    }

    /// Creates the station if the code is new and returns the stored row.
    ///
    /// Concurrent registrations of the same code converge on one row.
    pub async fn register(&self, code: &str, name: &str) -> Result<stations::Model, DbErr> {
        let model = stations::ActiveModel {
            id: Set(StationId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        };

        stations::Entity::insert(model)
            .on_conflict(OnConflict::column(stations::Column::Code).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;

        let station = stations::Entity::find()
            .filter(stations::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("station {code}")))?;

        self.cache.insert(code.to_string(), station.clone()).await;
        Ok(station)
    }

    /// Resolves the station of an inbound event.
    ///
    /// Unknown codes are registered under [`UnknownStationPolicy::Register`]
    /// (named after their code) and yield `None` under `Reject`.
    pub async fn resolve(
        &self,
        code: &str,
        policy: UnknownStationPolicy,
    ) -> Result<Option<stations::Model>, DbErr> {
        if let Some(station) = self.find_by_code(code).await? {
            return Ok(Some(station));
        }
        match policy {
            UnknownStationPolicy::Register => {
                tracing::info!(station_code = %code, "Registering unknown station");
                self.register(code, code).await.map(Some)
            }
            UnknownStationPolicy::Reject => Ok(None),
        }
    }
}
