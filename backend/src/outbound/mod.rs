//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel and `diesel-async`
//! - **memory**: in-process repositories for database-less runs and tests
//! - **suggestion**: chat completions client behind the assignee suggester
//!
//! Adapters translate between domain types and their infrastructure
//! representation and carry no business rules.

pub mod memory;
pub mod persistence;
pub mod suggestion;
