//! PostgreSQL-backed `LookupRepository` over the `lookup_entries` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::LookupEntry;
use crate::domain::ports::{LookupRepository, LookupRepositoryError};

use super::diesel_error_mapping::{classify_diesel_error, classify_pool_error};
use super::models::LookupRow;
use super::pool::DbPool;
use super::schema::lookup_entries;

#[derive(Clone)]
pub struct DieselLookupRepository {
    pool: DbPool,
}

impl DieselLookupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupRepository for DieselLookupRepository {
    async fn list_all(&self) -> Result<Vec<LookupEntry>, LookupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            classify_pool_error(err)
                .into_basic(LookupRepositoryError::connection, LookupRepositoryError::query)
        })?;
        let rows: Vec<LookupRow> = lookup_entries::table
            .order((lookup_entries::category.asc(), lookup_entries::description.asc()))
            .select(LookupRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| {
                classify_diesel_error(err)
                    .into_basic(LookupRepositoryError::connection, LookupRepositoryError::query)
            })?;
        rows.into_iter()
            .map(|row| row.into_domain().map_err(LookupRepositoryError::query))
            .collect()
    }
}
