use std::result::Result;

use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be deleted from the database
///
/// The deletion happens by key, without retrieving the model first.
pub trait DeleteStatic<K>: Model
where
    K: Send,
{
    /// Deletes the row #`id` from the database
    ///
    /// Returns `true` if the row was deleted, `false` if it didn't exist
    async fn delete_static(conn: &mut DbConnection, id: K) -> Result<bool, crate::Error>;

    /// Just like [DeleteStatic::delete_static] but returns `Err(fail())` if the row didn't exist
    async fn delete_static_or_fail<E, F>(conn: &mut DbConnection, id: K, fail: F) -> Result<(), E>
    where
        E: From<crate::Error>,
        F: FnOnce() -> E + Send,
    {
        match Self::delete_static(conn, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(fail()),
            Err(e) => Err(E::from(e)),
        }
    }
}
