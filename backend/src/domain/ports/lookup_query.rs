//! Driving port for catalogue reads.

use async_trait::async_trait;

use crate::domain::{Error, LookupCategory, LookupEntry};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupQuery: Send + Sync {
    /// Entries of `category` ordered by description.
    async fn list_category(&self, category: LookupCategory) -> Result<Vec<LookupEntry>, Error>;
}
