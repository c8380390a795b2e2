#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Store connection, schema reconciliation, and record queries for the
//! traffic log.
//!
//! Uses `switchy_database` for all store access. The reconciler in
//! [`reconcile`] replaces file-based migrations: the legacy stop tables
//! require catalog probing and conditional backfills that static SQL
//! files cannot express, so the migration steps live in code and run as
//! one transaction at session start.

pub mod db;
pub mod queries;
pub mod reconcile;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
