//! Shared Diesel error classification for the repository adapters.
//!
//! Each repository turns a [`DieselFailure`] into its own port error; the
//! classification itself (and the debug logging) lives here once.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Repository-agnostic view of a failed Diesel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped or could not be checked out.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key rejected the write or delete.
    ForeignKeyViolation { constraint: Option<String> },
    /// Anything else.
    Query(String),
}

/// Pool failures always surface as connection problems.
pub(crate) fn classify_pool_error(error: PoolError) -> DieselFailure {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    DieselFailure::Connection(message)
}

pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

impl DieselFailure {
    /// Collapse into a `(connection, query)` pair of constructors, used when a
    /// repository has no special handling for constraint violations.
    pub(crate) fn into_basic<E>(
        self,
        connection: impl FnOnce(String) -> E,
        query: impl FnOnce(String) -> E,
    ) -> E {
        match self {
            Self::Connection(message) => connection(message),
            Self::UniqueViolation { constraint } | Self::ForeignKeyViolation { constraint } => {
                query(format!(
                    "constraint violated: {}",
                    constraint.as_deref().unwrap_or("unknown")
                ))
            }
            Self::Query(message) => query(message),
        }
    }
}
