//! Persistence layer: libSQL-backed storage for jobs and packages.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, JobBoxFilter, JobBoxStats, JobCounts, JobFilter, JobListing};
