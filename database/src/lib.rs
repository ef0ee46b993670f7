pub mod db_connection_pool;
pub mod tables;

pub use db_connection_pool::DbConnection;
pub use db_connection_pool::DbConnectionPoolV2;

/// A diesel error that occurred while talking to PostgreSQL
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct DatabaseError(#[from] pub diesel::result::Error);
