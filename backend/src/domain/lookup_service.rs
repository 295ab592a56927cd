//! Read-only catalogue service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{LookupQuery, LookupRepository, LookupRepositoryError};
use crate::domain::{Error, LookupCatalogue, LookupCategory, LookupEntry};

/// Implements [`LookupQuery`] over a [`LookupRepository`].
#[derive(Clone)]
pub struct LookupCatalogueService<L> {
    lookups: Arc<L>,
}

impl<L> LookupCatalogueService<L> {
    pub fn new(lookups: Arc<L>) -> Self {
        Self { lookups }
    }
}

#[async_trait]
impl<L> LookupQuery for LookupCatalogueService<L>
where
    L: LookupRepository,
{
    async fn list_category(&self, category: LookupCategory) -> Result<Vec<LookupEntry>, Error> {
        let entries = self.lookups.list_all().await.map_err(|err| match err {
            LookupRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("lookup repository unavailable: {message}"))
            }
            LookupRepositoryError::Query { message } => {
                Error::internal(format!("lookup repository error: {message}"))
            }
        })?;
        Ok(LookupCatalogue::from_entries(entries).category(category))
    }
}
