//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::expression_methods::PgExpressionMethods;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{DirectoryUser, EmailAddress, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, classify_pool_error};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{tickets, users};

/// Directory storage over the `users` table.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    classify_pool_error(error).into_basic(
        UserPersistenceError::connection,
        UserPersistenceError::query,
    )
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    classify_diesel_error(error)
        .into_basic(UserPersistenceError::connection, UserPersistenceError::query)
}

/// Writes additionally translate the email unique constraint.
fn map_write_error(error: diesel::result::Error, user: &DirectoryUser) -> UserPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => {
            UserPersistenceError::duplicate_email(user.email.as_ref())
        }
        other => other.into_basic(UserPersistenceError::connection, UserPersistenceError::query),
    }
}

fn to_domain(row: UserRow) -> Result<DirectoryUser, UserPersistenceError> {
    row.into_domain().map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, user))?;
        Ok(())
    }

    async fn update(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(user.id.as_uuid()))
            .set(UserChangeset::from(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, user))?;
        if updated == 0 {
            return Err(UserPersistenceError::not_found(user.id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<DirectoryUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<DirectoryUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order((users::name.asc(), users::email.asc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| match classify_diesel_error(err) {
                DieselFailure::ForeignKeyViolation { .. } => UserPersistenceError::referenced(*id),
                other => {
                    other.into_basic(UserPersistenceError::connection, UserPersistenceError::query)
                }
            })?;
        if deleted == 0 {
            return Err(UserPersistenceError::not_found(*id));
        }
        Ok(())
    }

    async fn count_ticket_references(&self, id: &UserId) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = tickets::table
            .filter(
                tickets::requester_id
                    .eq(id.as_uuid())
                    .or(tickets::assignee_id.is_not_distinct_from(id.as_uuid())),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(count).map_err(|_| UserPersistenceError::query("negative reference count"))
    }
}
