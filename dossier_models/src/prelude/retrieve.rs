use std::result::Result;

use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be retrieved from the database
pub trait Retrieve<K>: Model
where
    K: Send,
{
    /// Retrieves the row #`id` and returns the model instance, or `None` if it doesn't exist
    async fn retrieve(conn: DbConnection, id: K) -> Result<Option<Self>, crate::Error>;

    /// Just like [Retrieve::retrieve] but returns `Err(fail())` if the row was not found
    async fn retrieve_or_fail<E, F>(conn: DbConnection, id: K, fail: F) -> Result<Self, E>
    where
        E: From<crate::Error>,
        F: FnOnce() -> E + Send,
    {
        match Self::retrieve(conn, id).await {
            Ok(Some(obj)) => Ok(obj),
            Ok(None) => Err(fail()),
            Err(e) => Err(E::from(e)),
        }
    }
}

/// Checks for the existence of a [Model] row in the database
pub trait Exists<K>: Model
where
    K: Send,
{
    /// Returns whether the row #`id` exists
    async fn exists(conn: &mut DbConnection, id: K) -> Result<bool, crate::Error>;
}
